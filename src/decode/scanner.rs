// Depth scanner: finds where a structural unit ends in a stream of decoded chunks.
//
// The counters live with the caller so a unit may span any number of chunks.
// A chunk boundary may fall anywhere: inside a number, a string, an escape
// sequence or a multi-byte character.

/// Which structural boundary ends the unit being scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// Brace depth returns to zero on a `}`.
    Object,
    /// Brace depth returns to zero on a `}`, or bracket depth returns to zero on a `]`.
    ElementOrListEnd,
}

/// Nesting state carried from one chunk to the next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Depth {
    pub brace: i32,
    pub bracket: i32,
    in_string: bool,
    escaped: bool,
}

impl Depth {
    pub fn new(brace: i32, bracket: i32) -> Self {
        Depth {
            brace,
            bracket,
            in_string: false,
            escaped: false,
        }
    }

    /// Scan `chunk` and return the length of the prefix that completes the unit,
    /// or `None` if the whole chunk belongs to an unfinished unit.
    ///
    /// Delimiters inside JSON strings are ignored.
    pub fn scan(&mut self, chunk: &[u8], boundary: Boundary) -> Option<usize> {
        for (i, &c) in chunk.iter().enumerate() {
            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if c == b'\\' {
                    self.escaped = true;
                } else if c == b'"' {
                    self.in_string = false;
                }
                continue;
            }
            match c {
                b'"' => self.in_string = true,
                b'{' => self.brace += 1,
                b'[' => self.bracket += 1,
                b'}' => {
                    self.brace -= 1;
                    if self.brace == 0 {
                        return Some(i + 1);
                    }
                }
                b']' => {
                    self.bracket -= 1;
                    if self.bracket == 0 && boundary == Boundary::ElementOrListEnd {
                        return Some(i + 1);
                    }
                }
                _ => {}
            }
        }
        None
    }
}

/// Feed one chunk into `pending`.
///
/// When the unit completes inside `chunk`, the completing prefix is appended
/// to `pending` and its length is returned; the rest of the chunk is left for
/// the next unit. Otherwise the whole chunk is appended and `None` is returned.
pub fn extract_unit(
    depth: &mut Depth,
    pending: &mut Vec<u8>,
    chunk: &[u8],
    boundary: Boundary,
) -> Option<usize> {
    match depth.scan(chunk, boundary) {
        Some(end) => {
            pending.extend_from_slice(&chunk[..end]);
            Some(end)
        }
        None => {
            pending.extend_from_slice(chunk);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Split `text` into `size`-byte chunks and collect every unit found,
    /// restarting the counters after each one.
    fn units(text: &[u8], size: usize, start: Depth, boundary: Boundary) -> Vec<Vec<u8>> {
        let mut found = Vec::new();
        let mut depth = start;
        let mut pending = Vec::new();
        for chunk in text.chunks(size) {
            let mut rest = chunk;
            while let Some(n) = extract_unit(&mut depth, &mut pending, rest, boundary) {
                found.push(std::mem::take(&mut pending));
                depth = start;
                rest = &rest[n..];
            }
        }
        found
    }

    #[test]
    fn test_object_completes_on_matching_brace() {
        let mut depth = Depth::new(0, 0);
        let text = br#"{"a": {"b": [1, 2]}, "c": 3} trailing"#;
        let end = depth.scan(text, Boundary::Object).unwrap();
        assert_eq!(&text[..end], br#"{"a": {"b": [1, 2]}, "c": 3}"#);
        assert_eq!(depth.brace, 0);
        assert_eq!(depth.bracket, 0);
    }

    #[test]
    fn test_need_more_input_keeps_depth() {
        let mut depth = Depth::new(0, 1);
        let mut pending = Vec::new();
        assert_eq!(
            extract_unit(&mut depth, &mut pending, br#" {"fields": [{"x": 1"#, Boundary::Object),
            None
        );
        assert_eq!(depth.brace, 2);
        assert_eq!(depth.bracket, 2);
        assert_eq!(pending.len(), 20);

        let n = extract_unit(&mut depth, &mut pending, b"}]} , {", Boundary::Object).unwrap();
        assert_eq!(n, 3);
        assert_eq!(pending, br#" {"fields": [{"x": 1}]}"#.to_vec());
    }

    #[test]
    fn test_list_end_only_when_awaited() {
        let mut depth = Depth::new(0, 1);
        assert_eq!(depth.scan(b" ]}", Boundary::Object), None);

        let mut depth = Depth::new(0, 1);
        assert_eq!(depth.scan(b"\n ]}", Boundary::ElementOrListEnd), Some(3));
        assert_eq!(depth.bracket, 0);
    }

    #[test]
    fn test_nested_list_close_does_not_end_element() {
        let mut depth = Depth::new(0, 1);
        let text = br#", {"standings": [], "fields": []}"#;
        assert_eq!(
            depth.scan(text, Boundary::ElementOrListEnd),
            Some(text.len())
        );
        assert_eq!(depth.bracket, 1);
    }

    #[test]
    fn test_delimiters_inside_strings_are_ignored() {
        let mut depth = Depth::new(0, 0);
        let text = br#"{"name": "brain \"}{\" ]", "x": 1}"#;
        assert_eq!(depth.scan(text, Boundary::Object), Some(text.len()));
    }

    #[test]
    fn test_escape_split_across_chunks() {
        let text = br#"{"s": "a\"}"}"#;
        let whole = units(text, text.len(), Depth::new(0, 0), Boundary::Object);
        for size in 1..text.len() {
            assert_eq!(
                units(text, size, Depth::new(0, 0), Boundary::Object),
                whole,
                "chunk size {size}"
            );
        }
    }

    #[test]
    fn test_units_invariant_to_chunk_size() {
        let text = br#" {"standings": [{"swarm_id": "A", "score": 1, "ants": 2}], "fields": []},
            {"standings": [], "fields": [{"x": 0, "y": 1, "type": "}", "markers": []}]},
            {"standings": [], "fields": []} ]"#;
        let whole = units(text, text.len(), Depth::new(0, 1), Boundary::ElementOrListEnd);
        assert_eq!(whole.len(), 4);
        for size in [1, 7, 4096] {
            assert_eq!(
                units(text, size, Depth::new(0, 1), Boundary::ElementOrListEnd),
                whole,
                "chunk size {size}"
            );
        }
    }
}
