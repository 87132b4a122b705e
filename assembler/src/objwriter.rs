use crate::assemble::{AssembledLine, ObjectCode};
use std::fmt::{self, Write};

// records are at most 60 hex chars, ie. 30 bytes
pub const RECORD_WIDTH: usize = 60;

// object code of one instruction or directive, tagged with its address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub address: u32,
    pub code: String,
}

impl Fragment {
    // size / 2 because code is in nibbles
    pub fn size(&self) -> u32 {
        (self.code.len() / 2) as u32
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRecord {
    pub address: u32,
    pub code: String,
}

impl ObjectRecord {
    pub fn as_str(&self) -> &str {
        &self.code
    }

    pub fn size(&self) -> u32 {
        (self.code.len() / 2) as u32
    }
}

impl fmt::Display for ObjectRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

/*
    groups fragments into records without ever splitting a fragment
    a record is closed before the fragment that would push it past the width
    with split_on_gap a record is also closed when the next fragment isn't
    right after it in memory, text records need that for their start address
*/
#[derive(Debug, Default)]
pub struct RecordBuilder {
    split_on_gap: bool,
    current: Option<ObjectRecord>,
    records: Vec<ObjectRecord>,
}

impl RecordBuilder {
    pub fn new() -> Self {
        RecordBuilder::default()
    }

    pub fn contiguous() -> Self {
        RecordBuilder {
            split_on_gap: true,
            ..RecordBuilder::default()
        }
    }

    pub fn push(&mut self, fragment: &Fragment) {
        if let Some(record) = &self.current {
            let gap = self.split_on_gap && record.address + record.size() != fragment.address;
            if gap || record.code.len() + fragment.code.len() > RECORD_WIDTH {
                self.flush();
            }
        }

        match &mut self.current {
            Some(record) => record.code.push_str(&fragment.code),
            None => {
                self.current = Some(ObjectRecord {
                    address: fragment.address,
                    code: fragment.code.clone(),
                })
            }
        }
    }

    fn flush(&mut self) {
        if let Some(record) = self.current.take() {
            self.records.push(record);
        }
    }

    pub fn finish(mut self) -> Vec<ObjectRecord> {
        self.flush();
        self.records
    }
}

pub fn write_obj_header(output: &mut String, name: &str, start: u32, len: u32) -> fmt::Result {
    writeln!(output, "H{:<6}{:06X}{:06X}", name, start, len)
}

pub fn write_obj_text(output: &mut String, record: &ObjectRecord) -> fmt::Result {
    writeln!(output, "T{:06X}{:02X}{}", record.address, record.size(), record.code)
}

pub fn write_obj_end(output: &mut String, first: u32) -> fmt::Result {
    writeln!(output, "E{:06X}", first)
}

fn write_object_program(output: &mut String, code: &ObjectCode) -> fmt::Result {
    let mut builder = RecordBuilder::contiguous();
    for fragment in &code.fragments {
        builder.push(fragment);
    }

    write_obj_header(output, code.name.as_deref().unwrap_or_default(), code.start, code.length())?;
    for record in builder.finish() {
        write_obj_text(output, &record)?;
    }
    write_obj_end(output, code.entry)
}

// complete object program: header, text records and end record
pub fn object_program(code: &ObjectCode) -> String {
    let mut output = String::new();
    write_object_program(&mut output, code).expect("writing to a String can't fail");
    output
}

fn write_lst_line(output: &mut String, line: &AssembledLine) -> fmt::Result {
    match line.address {
        Some(address) => {
            // shorten long codes to 6 chars
            let machine_code = if line.code.len() > 6 {
                format!("{}..{}", &line.code[..2], &line.code[line.code.len() - 2..])
            } else {
                line.code.clone()
            };
            writeln!(output, "{:05X}  {:>6}    {}", address, machine_code, line.text)
        }
        // comments, empty and skipped lines
        None => writeln!(output, "                 {}", line.text),
    }
}

// listing: location, object code and source of every line
pub fn listing(code: &ObjectCode) -> String {
    let mut output = String::new();
    for line in &code.lines {
        write_lst_line(&mut output, line).expect("writing to a String can't fail");
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frag(address: u32, code: &str) -> Fragment {
        Fragment {
            address,
            code: code.to_owned(),
        }
    }

    #[test]
    fn records_hold_whole_fragments() {
        let mut builder = RecordBuilder::new();
        for i in 0..11 {
            builder.push(&frag(i * 3, "001000"));
        }
        let records = builder.finish();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].code.len(), 60);
        assert_eq!(records[1].code, "001000");
        assert_eq!(records[1].address, 30);
    }

    #[test]
    fn overflowing_fragment_starts_next_record() {
        let mut builder = RecordBuilder::new();
        builder.push(&frag(0, &"AB".repeat(28)));
        builder.push(&frag(28, "0C1000"));
        let records = builder.finish();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].code.len(), 56);
        assert_eq!(records[1].code, "0C1000");
    }

    #[test]
    fn gaps_only_split_contiguous_records() {
        let fragments = [frag(0, "000005"), frag(9, "000006")];

        let mut plain = RecordBuilder::new();
        let mut text = RecordBuilder::contiguous();
        for f in &fragments {
            plain.push(f);
            text.push(f);
        }
        assert_eq!(plain.finish().len(), 1);

        let text = text.finish();
        assert_eq!(text.len(), 2);
        assert_eq!(text[1].address, 9);
    }

    #[test]
    fn empty_builder_has_no_records() {
        assert!(RecordBuilder::new().finish().is_empty());
    }

    #[test]
    fn record_lines() {
        let mut out = String::new();
        write_obj_header(&mut out, "COPY", 0x1000, 0x6).unwrap();
        write_obj_text(&mut out, &ObjectRecord { address: 0x1000, code: "001003000005".to_owned() }).unwrap();
        write_obj_end(&mut out, 0x1000).unwrap();
        assert_eq!(out, "HCOPY  001000000006\nT00100006001003000005\nE001000\n");
    }

    #[test]
    fn listing_lines() {
        let line = |address, code: &str, text: &str| AssembledLine {
            line: 1,
            address,
            code: code.to_owned(),
            text: text.to_owned(),
        };
        let mut out = String::new();
        write_lst_line(&mut out, &line(Some(0x1000), "001003", "FIRST LDA FIVE")).unwrap();
        write_lst_line(&mut out, &line(Some(0x1003), "454F4646", "EOF BYTE C'EOFF'")).unwrap();
        write_lst_line(&mut out, &line(None, "", "HALT")).unwrap();
        assert_eq!(
            out,
            "01000  001003    FIRST LDA FIVE\n\
             01003  45..46    EOF BYTE C'EOFF'\n\
             \x20                HALT\n"
        );
    }
}
