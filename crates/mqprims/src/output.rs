use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use mqprims::records::{MemAccess, MemRef, READ, WRITE};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// One printable row per received record.
#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct RecordOutput {
    pub seq: usize,
    pub kind: &'static str,
    pub addr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pc: Option<String>,
}

/// Records the CLI knows how to print.
pub trait ToOutput {
    fn to_output(&self, seq: usize) -> RecordOutput;
}

impl ToOutput for MemAccess {
    fn to_output(&self, seq: usize) -> RecordOutput {
        RecordOutput {
            seq,
            kind: kind_name(self.kind),
            addr: format!("{:#x}", self.addr),
            pc: None,
        }
    }
}

impl ToOutput for MemRef {
    fn to_output(&self, seq: usize) -> RecordOutput {
        RecordOutput {
            seq,
            kind: kind_name(self.kind),
            addr: format!("{:#x}", self.addr),
            pc: Some(format!("{:#x}", self.pc)),
        }
    }
}

pub fn print_record(row: &RecordOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(row).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            let mut header = vec!["SEQ", "KIND", "ADDR"];
            let mut cells = vec![row.seq.to_string(), row.kind.to_string(), row.addr.clone()];
            if let Some(pc) = &row.pc {
                header.push("PC");
                cells.push(pc.clone());
            }
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(header)
                .add_row(cells);
            println!("{table}");
        }
        OutputFormat::Pretty => match &row.pc {
            Some(pc) => println!("{}: {} {} (pc {})", row.seq, row.kind, row.addr, pc),
            None => println!("{}: {} {}", row.seq, row.kind, row.addr),
        },
    }
}

pub fn kind_name(kind: u8) -> &'static str {
    match kind {
        READ => "read",
        WRITE => "write",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mem_access_row() {
        let row = MemAccess::sample(1).to_output(1);
        assert_eq!(
            row,
            RecordOutput {
                seq: 1,
                kind: "read",
                addr: "0x1010".to_string(),
                pc: None,
            }
        );
        assert_eq!(
            serde_json::to_string(&row).unwrap(),
            r#"{"seq":1,"kind":"read","addr":"0x1010"}"#
        );
    }

    #[test]
    fn mem_ref_row_includes_pc() {
        let row = MemRef::sample(0).to_output(0);
        assert_eq!(row.kind, "write");
        assert_eq!(row.pc.as_deref(), Some("0x400000"));
    }

    #[test]
    fn unknown_kind() {
        assert_eq!(kind_name(b'x'), "unknown");
    }
}
