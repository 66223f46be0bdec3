use super::model::Story;
use serde::{Serialize, ser::Error as _};
use serde_json::ser::{Formatter, Serializer};
use std::io;

/// Compact single-line output with a space after every `:` and `,`.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

/// Renders `[{"title": "...", "link": "..."}, ...]`, escaping string contents.
pub fn to_json(stories: &[Story]) -> serde_json::Result<String> {
    let mut ser = Serializer::with_formatter(Vec::new(), SpacedFormatter);
    stories.serialize(&mut ser)?;
    String::from_utf8(ser.into_inner()).map_err(serde_json::Error::custom)
}
