use std::fmt;

/// Selects which family of indexed values an index instance covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValueKind {
    /// Text node contents.
    #[default]
    Text,
    /// Attribute values.
    Attribute,
}

impl ValueKind {
    /// Common file name prefix of the index files of this kind.
    pub fn file_prefix(self) -> &'static str {
        match self {
            ValueKind::Text => "txt",
            ValueKind::Attribute => "atv",
        }
    }

    /// File name of the list file (`txtl` / `atvl`).
    pub fn list_file(self) -> String {
        format!("{}l", self.file_prefix())
    }

    /// File name of the reference file (`txtr` / `atvr`).
    pub fn refs_file(self) -> String {
        format!("{}r", self.file_prefix())
    }

    pub fn is_text(self) -> bool {
        self == ValueKind::Text
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Text => f.write_str("texts"),
            ValueKind::Attribute => f.write_str("attribute values"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ValueKind;

    #[test]
    fn test_file_names() {
        assert_eq!(ValueKind::Text.list_file(), "txtl");
        assert_eq!(ValueKind::Text.refs_file(), "txtr");
        assert_eq!(ValueKind::Attribute.list_file(), "atvl");
        assert_eq!(ValueKind::Attribute.refs_file(), "atvr");
        assert!(ValueKind::default().is_text());
    }
}
