use crate::error::{Error, Result};
use crate::parser::parse_hex;
use indexmap::IndexMap;
use std::fmt;
use std::str::FromStr;

/// Label to address mapping, kept in definition order.
///
/// Pass 1 is the only writer. Once built the table is read-only; a table
/// produced elsewhere can be brought in with [`SymbolTable::from_hex_map`]
/// or parsed from its `NAME: ADDRESS` text form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    symbols: IndexMap<String, u32>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            symbols: IndexMap::new(),
        }
    }

    // insert only, returns false when the name is already taken
    pub(crate) fn define(&mut self, name: &str, address: u32) -> bool {
        if self.symbols.contains_key(name) {
            return false;
        }
        self.symbols.insert(name.to_owned(), address);
        true
    }

    pub fn get(&self, name: &str) -> Option<u32> {
        self.symbols.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.symbols.iter().map(|(name, addr)| (name.as_str(), *addr))
    }

    /// Build a table from `name -> hexadecimal address` pairs.
    pub fn from_hex_map<I, K, V>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut symtab = SymbolTable::new();
        for (name, value) in entries {
            let (name, value) = (name.as_ref().trim(), value.as_ref().trim());
            let address = parse_hex(value).map_err(|_| Error::InvalidAddress {
                symbol: name.to_owned(),
                value: value.to_owned(),
            })?;
            // a map can't repeat a key, so later entries just win
            symtab.symbols.insert(name.to_owned(), address);
        }
        Ok(symtab)
    }

    pub fn to_hex_map(&self) -> IndexMap<String, String> {
        self.iter()
            .map(|(name, addr)| (name.to_owned(), format!("{:04X}", addr)))
            .collect()
    }
}

impl fmt::Display for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, addr) in self.iter() {
            writeln!(f, "{}: {:04X}", name, addr)?;
        }
        Ok(())
    }
}

impl FromStr for SymbolTable {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        let mut symtab = SymbolTable::new();
        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Some((name, value)) = line.split_once(':') else {
                return Err(Error::MalformedTable { line: idx + 1 });
            };
            let (name, value) = (name.trim(), value.trim());
            if name.is_empty() {
                return Err(Error::MalformedTable { line: idx + 1 });
            }
            let address = parse_hex(value).map_err(|_| Error::InvalidAddress {
                symbol: name.to_owned(),
                value: value.to_owned(),
            })?;
            if !symtab.define(name, address) {
                return Err(Error::DuplicateSymbol {
                    line: idx + 1,
                    symbol: name.to_owned(),
                });
            }
        }
        Ok(symtab)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_is_insert_only() {
        let mut symtab = SymbolTable::new();
        assert!(symtab.define("ALPHA", 3));
        assert!(!symtab.define("ALPHA", 9));
        assert_eq!(symtab.get("ALPHA"), Some(3));
        assert_eq!(symtab.len(), 1);
    }

    #[test]
    fn hex_map_import() {
        let symtab = SymbolTable::from_hex_map([("ALPHA", "0x3"), ("BETA", "1A")]).unwrap();
        assert_eq!(symtab.get("ALPHA"), Some(3));
        assert_eq!(symtab.get("BETA"), Some(0x1A));

        let err = SymbolTable::from_hex_map([("ALPHA", "xyz")]).unwrap_err();
        assert!(matches!(err, Error::InvalidAddress { .. }));
    }

    #[test]
    fn text_form_round_trips_in_order() {
        let symtab = SymbolTable::from_hex_map([("ZETA", "10"), ("ALPHA", "3")]).unwrap();
        let text = symtab.to_string();
        assert_eq!(text, "ZETA: 0010\nALPHA: 0003\n");
        assert_eq!(text.parse::<SymbolTable>().unwrap(), symtab);
    }

    #[test]
    fn text_form_errors() {
        assert_eq!(
            "ALPHA: 3\nALPHA: 4".parse::<SymbolTable>(),
            Err(Error::DuplicateSymbol {
                line: 2,
                symbol: "ALPHA".to_owned()
            })
        );
        assert_eq!(
            "\nALPHA 3".parse::<SymbolTable>(),
            Err(Error::MalformedTable { line: 2 })
        );
    }
}
