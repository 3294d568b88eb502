//! Minimal RFC 4180 writer
//!
//! Fields containing a comma, quote, CR or LF are quoted, embedded quotes
//! doubled. Records end with CRLF. `None` is written as an empty field.

#[derive(Debug, Default)]
pub struct CsvWriter {
    buf: String,
}

impl CsvWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(columns: &[&str]) -> Self {
        let mut w = Self::new();
        w.write_record(columns.iter().map(|c| Some(*c)));
        w
    }

    pub fn write_record<'a, I>(&mut self, fields: I)
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        for (i, field) in fields.into_iter().enumerate() {
            if i > 0 {
                self.buf.push(',');
            }
            if let Some(value) = field {
                push_field(&mut self.buf, value);
            }
        }
        self.buf.push_str("\r\n");
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf.into_bytes()
    }
}

fn push_field(buf: &mut String, value: &str) {
    if value.contains([',', '"', '\r', '\n']) {
        buf.push('"');
        buf.push_str(&value.replace('"', "\"\""));
        buf.push('"');
    } else {
        buf.push_str(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(rows: &[&[Option<&str>]]) -> String {
        let mut w = CsvWriter::new();
        for row in rows {
            w.write_record(row.iter().copied());
        }
        String::from_utf8(w.into_bytes()).unwrap()
    }

    #[test]
    fn plain_fields_are_unquoted() {
        assert_eq!(render(&[&[Some("1"), Some("Farinha"), Some("550")]]), "1,Farinha,550\r\n");
    }

    #[test]
    fn special_characters_are_quoted() {
        assert_eq!(
            render(&[&[Some("a,b"), Some("say \"hi\""), Some("two\nlines")]]),
            "\"a,b\",\"say \"\"hi\"\"\",\"two\nlines\"\r\n"
        );
    }

    #[test]
    fn null_is_empty_field() {
        assert_eq!(render(&[&[Some("1"), None, Some("")]]), "1,,\r\n");
    }

    #[test]
    fn header_comes_first() {
        let mut w = CsvWriter::with_header(&["id", "name"]);
        w.write_record([Some("7"), Some("Sal")]);
        assert_eq!(String::from_utf8(w.into_bytes()).unwrap(), "id,name\r\n7,Sal\r\n");
    }
}
