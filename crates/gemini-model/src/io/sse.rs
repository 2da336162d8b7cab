use super::{Chunks, ChunksError};

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    ChunksError(ChunksError),
    InvalidPayload,
}

/// A type for reading server-sent events from a chunk stream.
///
/// Only the `data` field is surfaced; `event`, `id`, `retry` and comment
/// lines are accepted and dropped. Multiple `data` lines of one event are
/// joined with a line feed.
pub struct Sse {
    buf: String,
    // Trailing bytes of an UTF-8 sequence that was split across chunks.
    incomplete: Vec<u8>,
    chunks: Chunks,
}

impl Sse {
    #[inline]
    pub fn new(chunks: Chunks) -> Self {
        Self {
            buf: String::new(),
            incomplete: Vec::new(),
            chunks,
        }
    }

    pub async fn next_event(&mut self) -> Result<Option<String>, Error> {
        loop {
            // Drain what is already buffered before touching the network.
            if let Some(event) = self.try_parse_event()? {
                return Ok(Some(event));
            }

            let Some(bytes) =
                self.chunks.next_chunk().await.map_err(Error::ChunksError)?
            else {
                // Whatever is left is an unterminated event, drop it.
                return Ok(None);
            };
            self.push_bytes(&bytes)?;
        }
    }

    fn push_bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.incomplete.extend_from_slice(bytes);
        let valid_len = match str::from_utf8(&self.incomplete) {
            Ok(_) => self.incomplete.len(),
            Err(err) if err.error_len().is_none() => err.valid_up_to(),
            Err(_) => return Err(Error::InvalidPayload),
        };
        let rest = self.incomplete.split_off(valid_len);
        let valid = std::mem::replace(&mut self.incomplete, rest);
        let Ok(text) = String::from_utf8(valid) else {
            return Err(Error::InvalidPayload);
        };
        // CR only appears as part of line endings, JSON payloads escape it.
        self.buf.extend(text.chars().filter(|c| *c != '\r'));
        Ok(())
    }

    fn try_parse_event(&mut self) -> Result<Option<String>, Error> {
        loop {
            let Some(end_idx) = self.buf.find("\n\n") else {
                return Ok(None);
            };

            let mut data: Option<String> = None;
            for line in self.buf[..end_idx].lines() {
                if line.starts_with(':') {
                    continue;
                }
                let (name, value) = match line.split_once(':') {
                    Some((name, value)) => {
                        (name, value.strip_prefix(' ').unwrap_or(value))
                    }
                    None => (line, ""),
                };
                match name {
                    "data" => {
                        let data = data.get_or_insert_with(String::new);
                        if !data.is_empty() {
                            data.push('\n');
                        }
                        data.push_str(value);
                    }
                    // Other fields carry nothing a reply needs.
                    _ => {}
                }
            }

            // Consume the event including the blank line.
            self.buf.drain(..end_idx + 2);

            if let Some(data) = data {
                return Ok(Some(data));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn sse_from(chunks: &[&'static [u8]]) -> Sse {
        let chunks = chunks.iter().map(|c| Bytes::from_static(*c)).collect();
        Sse::new(Chunks::from_vec_deque(chunks))
    }

    #[tokio::test]
    async fn test_normal_events() {
        let mut sse = sse_from(&[b"data: hello\n\n", b"data: bye\n\n"]);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "hello");
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "bye");
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unknown_fields_are_ignored() {
        let mut sse = sse_from(&[
            b"event: message\nid: 7\nfoo: bar\nretry: 100\ndata: hi\n\n",
            b"x-custom\n\ndata: bye\n\n",
        ]);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "hi");
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "bye");
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_crlf_and_split_chunks() {
        let mut sse = sse_from(&[
            b"data: {\"text\": ",
            b"\"a: b\"}\r",
            b"\n\r\n",
            b"data: two\r\n\r\n",
        ]);
        assert_eq!(
            sse.next_event().await.unwrap().unwrap(),
            "{\"text\": \"a: b\"}"
        );
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "two");
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_split_utf8_sequence() {
        // "Hà Nội" with the two-byte `à` split between chunks.
        let mut sse = sse_from(&[b"data: H\xc3", b"\xa0 N\xe1\xbb\x99i\n\n"]);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "Hà Nội");
    }

    #[tokio::test]
    async fn test_comments_and_multiline_data() {
        let mut sse =
            sse_from(&[b": keep-alive\n\nevent: message\ndata: a\ndata: b\n\n"]);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "a\nb");
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_invalid_data() {
        let mut sse = sse_from(&[b"xxxxxx\n\n"]);
        assert_eq!(sse.next_event().await.unwrap_err(), Error::InvalidPayload);

        let mut sse = sse_from(&[b"data: \xff\xfe\n\n"]);
        assert_eq!(sse.next_event().await.unwrap_err(), Error::InvalidPayload);

        // Unterminated events are dropped at the end of the stream.
        let mut sse = sse_from(&[b"data: hello\n", b"data: bye\n"]);
        assert_eq!(sse.next_event().await.unwrap(), None);
    }
}
