//! Frame ID upgrades from older ID3v2 versions
//!
//! Frames are always handled under their ID3v2.4 identifiers, older identifiers are converted
//! as soon as the frame header is read.

macro_rules! upgrade_table {
	($name:ident; $($old:literal => $new:literal),+ $(,)?) => {
		pub(crate) fn $name(id: &str) -> Option<&'static str> {
			match id {
				$($old => Some($new),)+
				_ => None,
			}
		}
	};
}

upgrade_table!(
	upgrade_v2;

	"TT1" => "TIT1", "TT2" => "TIT2", "TT3" => "TIT3",
	"TP1" => "TPE1", "TP2" => "TPE2", "TP3" => "TPE3", "TP4" => "TPE4",
	"TCM" => "TCOM", "TXT" => "TEXT", "TAL" => "TALB",
	"TRK" => "TRCK", "TPA" => "TPOS", "TYE" => "TDRC",
	"TCO" => "TCON", "TEN" => "TENC", "TSS" => "TSSE",
	"TCR" => "TCOP", "TPB" => "TPUB", "TBP" => "TBPM",
	"TRC" => "TSRC", "TLA" => "TLAN", "TCP" => "TCMP",
	"TST" => "TSOT", "TSP" => "TSOP", "TSA" => "TSOA",
	"TOA" => "TOPE", "TOT" => "TOAL", "TOL" => "TOLY",
	"TOR" => "TDOR", "TKE" => "TKEY", "TFT" => "TFLT",
	"TLE" => "TLEN", "TMT" => "TMED", "TOF" => "TOFN",
	"TXX" => "TXXX", "WXX" => "WXXX",
	"COM" => "COMM", "ULT" => "USLT", "PIC" => "APIC",
	"UFI" => "UFID", "GEO" => "GEOB", "CNT" => "PCNT",
	"POP" => "POPM",
	"WAF" => "WOAF", "WAR" => "WOAR", "WAS" => "WOAS",
	"WCM" => "WCOM", "WCP" => "WCOP", "WPB" => "WPUB",
	"ETC" => "ETCO", "MCI" => "MCDI", "SLT" => "SYLT",
	"STC" => "SYTC", "IPL" => "TIPL", "BUF" => "RBUF",
	"CRA" => "AENC", "LNK" => "LINK", "MLL" => "MLLT",
	"REV" => "RVRB",
);

upgrade_table!(
	upgrade_v3;

	"TYER" => "TDRC",
	"TORY" => "TDOR",
	"IPLS" => "TIPL",
);

/// Frames dropped when writing ID3v2.3, as they only exist in ID3v2.4
pub(crate) fn is_v4_only(id: &str) -> bool {
	matches!(
		id,
		"ASPI"
			| "EQU2" | "RVA2"
			| "SEEK" | "SIGN"
			| "TDEN" | "TDRL"
			| "TDTG" | "TMOO"
			| "TPRO" | "TSST"
	)
}
