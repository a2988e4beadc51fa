//! Pages: one screen of display content with its own animation and delay.

use alloc::{
    string::{String, ToString},
    vec::Vec,
};
use core::{fmt, str::FromStr};

use crate::{
    decode::{Decode, DecodeError, DecodeErrorKind, expect_byte},
    encode::{Encode, EncodeError, MessageEncoder},
    text::{self, LINE_BREAK, RIGHT_ALIGN},
};

/// Separates the `<animation><delay>` header from the page text.
pub const ATTRIBUTES_SEPARATOR: char = '^';

/// Starts a new display line in page text.
pub const LINE_SEPARATOR: char = '_';

/// Right-aligns the remainder of the current line in page text.
pub const RIGHT_ALIGN_MARKER: char = '~';

/// Terminates the encoded form of every page.
pub const PAGE_TERMINATOR: u8 = 0x0D;

/// Entry animation of a [`Page`].
///
/// Each animation has a letter used in page text and a byte used on the wire.
/// The display knows more animations than are listed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Animation {
    /// Appear instantly. Text that does not fit is clipped. The delay starts
    /// immediately.
    None,

    /// Scroll into view from the bottom and stay. The delay starts once the
    /// text is fully shown.
    VerticalScroll,

    /// Scroll in from the right while pushing the previous page out, then
    /// scroll out to the left. The delay starts once the text has left the
    /// display, so a delay of `0` is usual.
    HorizontalScroll,
}

impl Animation {
    const ALL: [Self; 3] = [Self::None, Self::VerticalScroll, Self::HorizontalScroll];

    /// Letter naming this animation in page text.
    pub const fn letter(self) -> char {
        match self {
            Self::None => 'N',
            Self::VerticalScroll => 'V',
            Self::HorizontalScroll => 'H',
        }
    }

    /// Byte identifying this animation on the wire.
    pub const fn code(self) -> u8 {
        match self {
            Self::None => 0x00,
            Self::VerticalScroll => 0x1D,
            Self::HorizontalScroll => 0x2F,
        }
    }

    /// Looks up an animation by its (case-insensitive) letter.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::UnknownAnimation`] if no known animation uses
    /// `letter`.
    pub fn from_letter(letter: char) -> Result<Self, EncodeError> {
        let upper = letter.to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|animation| animation.letter() == upper)
            .ok_or(EncodeError::UnknownAnimation(letter))
    }

    /// Looks up an animation by its wire byte.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeErrorKind::UnknownAnimation`] if no known animation uses
    /// `code`.
    pub fn from_code(code: u8) -> Result<Self, DecodeError> {
        Self::ALL
            .into_iter()
            .find(|animation| animation.code() == code)
            .ok_or_else(|| DecodeError::new::<Self>(DecodeErrorKind::UnknownAnimation(code)))
    }
}

impl Encode for Animation {
    fn size(&self) -> usize {
        1
    }

    fn encode(&self, data: &mut [u8]) {
        data[0] = self.code();
    }
}

impl Decode for Animation {
    fn decode(data: &mut &[u8]) -> Result<Self, DecodeError> {
        Self::from_code(u8::decode(data)?)
    }
}

/// One line of a [`Page`]: left-aligned text followed by an optional
/// right-aligned run.
///
/// # Invariants
///
/// - Every character is representable on the display.
/// - Neither run contains the text `\R`, which the display reads as the
///   right alignment control sequence.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct Line {
    text: String,
    right: Option<String>,
}

impl Line {
    /// Creates a left-aligned line.
    ///
    /// # Errors
    ///
    /// Returns an [`EncodeError`] if `text` cannot be shown on the display.
    pub fn new(text: impl Into<String>) -> Result<Self, EncodeError> {
        let text = text.into();
        validate_run(&text)?;
        Ok(Self { text, right: None })
    }

    /// Adds a right-aligned run after the left-aligned text. Calling this
    /// again appends to the existing run.
    ///
    /// # Errors
    ///
    /// Returns an [`EncodeError`] if `right` cannot be shown on the display.
    pub fn with_right(mut self, right: impl AsRef<str>) -> Result<Self, EncodeError> {
        let mut run = self.right.take().unwrap_or_default();
        run.push_str(right.as_ref());
        validate_run(&run)?;
        self.right = Some(run);
        Ok(self)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn right(&self) -> Option<&str> {
        self.right.as_deref()
    }

    /// Returns `true` if the line shows nothing and has no alignment marker.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.right.is_none()
    }

    /// Decodes the bytes of a single line, which must not contain a line break.
    fn decode_line(bytes: &[u8]) -> Result<Self, DecodeError> {
        let decode_run = |run: &[u8]| -> Result<String, DecodeError> {
            run.iter().map(|&byte| text::decode_byte(byte)).collect()
        };

        let Some((left, mut rest)) = split_right_align(bytes) else {
            return Ok(Self {
                text: decode_run(bytes)?,
                right: None,
            });
        };

        // Any further alignment markers are folded into the same run.
        let mut right = String::new();
        while let Some((run, after)) = split_right_align(rest) {
            right.push_str(&decode_run(run)?);
            rest = after;
        }
        right.push_str(&decode_run(rest)?);

        Ok(Self {
            text: decode_run(left)?,
            right: Some(right),
        })
    }
}

/// Splits `bytes` around the first right alignment control sequence.
fn split_right_align(bytes: &[u8]) -> Option<(&[u8], &[u8])> {
    let index = bytes
        .windows(RIGHT_ALIGN.len())
        .position(|window| window == RIGHT_ALIGN)?;
    Some((&bytes[..index], &bytes[index + RIGHT_ALIGN.len()..]))
}

fn validate_run(run: &str) -> Result<(), EncodeError> {
    text::validate(run)?;
    if run.contains("\\R") {
        return Err(EncodeError::ReservedSequence);
    }
    Ok(())
}

impl FromStr for Line {
    type Err = EncodeError;

    /// Parses one line of page text. A `~` starts the right-aligned run;
    /// later `~` characters on the same line append to that run.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut runs = s.split(RIGHT_ALIGN_MARKER);
        let mut line = Self::new(runs.next().unwrap_or_default())?;
        for run in runs {
            line = line.with_right(run)?;
        }
        Ok(line)
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)?;
        if let Some(right) = &self.right {
            write!(f, "{RIGHT_ALIGN_MARKER}{right}")?;
        }
        Ok(())
    }
}

impl Encode for Line {
    fn size(&self) -> usize {
        // Every supported character encodes to exactly one byte.
        self.text.chars().count()
            + self
                .right
                .as_ref()
                .map_or(0, |right| RIGHT_ALIGN.len() + right.chars().count())
    }

    fn encode(&self, data: &mut [u8]) {
        let mut enc = MessageEncoder::new(data);
        encode_run(&mut enc, &self.text);
        if let Some(right) = &self.right {
            enc.write(&RIGHT_ALIGN);
            encode_run(&mut enc, right);
        }
    }
}

fn encode_run(enc: &mut MessageEncoder<'_>, run: &str) {
    for c in run.chars() {
        // Runs are validated when a line is built.
        let byte = text::encode_char(c).unwrap_or_else(|_| unreachable!("{c:?} was validated"));
        enc.write(&byte);
    }
}

/// One screen of a display message.
///
/// # Encoding
///
/// | Field       | Size | Description |
/// |-------------|------|-------------|
/// | `animation` | 1    | [`Animation::code`]. |
/// | `offset`    | 1    | Number of leading empty lines. |
/// | `delay`     | 1    | Pause after the animation, in quarter seconds. |
/// | `reserved`  | 1    | Always `0x00`. |
/// | `text`      | n    | Remaining lines, separated by [`LINE_BREAK`]. |
/// | terminator  | 1    | [`PAGE_TERMINATOR`]. |
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Page {
    animation: Animation,
    delay: u8,
    lines: Vec<Line>,
}

impl Page {
    /// Lines shown by the display.
    pub const MAX_LINES: usize = 2;

    pub const DEFAULT_ANIMATION: Animation = Animation::None;
    pub const DEFAULT_DELAY: u8 = 20;

    /// Creates a page. An empty `lines` is treated as a single empty line.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::TooManyLines`] if more than [`Page::MAX_LINES`]
    /// lines are given.
    pub fn new(animation: Animation, delay: u8, mut lines: Vec<Line>) -> Result<Self, EncodeError> {
        if lines.len() > Self::MAX_LINES {
            return Err(EncodeError::TooManyLines(lines.len()));
        }
        if lines.is_empty() {
            lines.push(Line::default());
        }

        Ok(Self {
            animation,
            delay,
            lines,
        })
    }

    /// Parses page text, falling back to the given animation and delay when
    /// the text does not specify them.
    ///
    /// Accepted forms are `<text>`, `^<text>`, `<animation>^<text>`,
    /// `<delay>^<text>` and `<animation><delay>^<text>`.
    ///
    /// # Errors
    ///
    /// Returns an [`EncodeError`] if the animation letter is unknown, the
    /// delay does not fit in a byte, or the text cannot be shown.
    pub fn parse_with_defaults(
        s: &str,
        default_animation: Animation,
        default_delay: u8,
    ) -> Result<Self, EncodeError> {
        let (header, body) = match s.split_once(ATTRIBUTES_SEPARATOR) {
            Some((header, body)) if is_header(header) => (Some(header), body),
            _ => (None, s),
        };

        let mut animation = default_animation;
        let mut delay = default_delay;

        if let Some(header) = header {
            let digits = match header.chars().next() {
                Some(letter) if letter.is_ascii_alphabetic() => {
                    animation = Animation::from_letter(letter)?;
                    &header[letter.len_utf8()..]
                }
                _ => header,
            };
            if !digits.is_empty() {
                delay = digits
                    .parse()
                    .map_err(|_| EncodeError::DelayOutOfRange(digits.to_string()))?;
            }
        }

        let lines = body
            .split(LINE_SEPARATOR)
            .map(Line::from_str)
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(animation, delay, lines)
    }

    pub fn animation(&self) -> Animation {
        self.animation
    }

    /// Pause after the animation completes, in quarter seconds.
    pub fn delay(&self) -> u8 {
        self.delay
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Number of leading empty lines, which the display encodes as an offset
    /// rather than as line breaks. The last line always stays in the text.
    fn offset(&self) -> usize {
        self.lines[..self.lines.len() - 1]
            .iter()
            .take_while(|line| line.is_empty())
            .count()
    }
}

/// `[A-Za-z]?[0-9]*`
fn is_header(header: &str) -> bool {
    let mut chars = header.chars().peekable();
    chars.next_if(char::is_ascii_alphabetic);
    chars.all(|c| c.is_ascii_digit())
}

impl FromStr for Page {
    type Err = EncodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_with_defaults(s, Self::DEFAULT_ANIMATION, Self::DEFAULT_DELAY)
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{ATTRIBUTES_SEPARATOR}",
            self.animation.letter(),
            self.delay
        )?;
        for (index, line) in self.lines.iter().enumerate() {
            if index > 0 {
                write!(f, "{LINE_SEPARATOR}")?;
            }
            write!(f, "{line}")?;
        }
        Ok(())
    }
}

impl Encode for Page {
    fn size(&self) -> usize {
        let shown = &self.lines[self.offset()..];
        let text_size: usize = shown.iter().map(Encode::size).sum();

        4 + text_size + (shown.len() - 1) + 1
    }

    fn encode(&self, data: &mut [u8]) {
        let offset = self.offset();
        let mut enc = MessageEncoder::new(data);

        enc.write(&self.animation);
        enc.write(&(offset as u8));
        enc.write(&self.delay);
        enc.write(&0x00u8);

        for (index, line) in self.lines[offset..].iter().enumerate() {
            if index > 0 {
                enc.write(&LINE_BREAK);
            }
            enc.write(line);
        }

        enc.write(&PAGE_TERMINATOR);
    }
}

impl Decode for Page {
    fn decode(data: &mut &[u8]) -> Result<Self, DecodeError> {
        let animation = Animation::decode(data)?;
        let offset = u8::decode(data)? as usize;
        let delay = u8::decode(data)?;
        expect_byte::<Self>(data, "reserved", &[0x00])?;

        let end = data
            .iter()
            .position(|&b| b == PAGE_TERMINATOR)
            .ok_or_else(|| DecodeError::new::<Self>(DecodeErrorKind::UnexpectedEnd))?;
        let text = &data[..end];
        *data = &data[end + 1..];

        let line_count = offset + text.split(|&b| b == LINE_BREAK).count();
        if line_count > Self::MAX_LINES {
            return Err(DecodeError::new::<Self>(DecodeErrorKind::TooManyLines(
                line_count,
            )));
        }

        let mut lines = Vec::with_capacity(line_count);
        lines.resize(offset, Line::default());
        for line in text.split(|&b| b == LINE_BREAK) {
            lines.push(Line::decode_line(line)?);
        }

        Ok(Self {
            animation,
            delay,
            lines,
        })
    }
}

#[cfg(test)]
mod tests {
    use alloc::{format, vec};

    use super::*;

    fn page(s: &str) -> Page {
        s.parse().unwrap()
    }

    fn round_trip(page: &Page) -> Page {
        let bytes = page.to_bytes();
        let mut data = bytes.as_slice();
        let decoded = Page::decode(&mut data).unwrap();
        assert!(data.is_empty());
        decoded
    }

    #[test]
    fn text_defaults() {
        let p = page("12:34 FUNKYTOWN~5_Limited Express");
        assert_eq!(p.animation(), Animation::None);
        assert_eq!(p.delay(), 20);
        assert_eq!(format!("{p}"), "N20^12:34 FUNKYTOWN~5_Limited Express");
    }

    #[test]
    fn header_forms() {
        assert_eq!(format!("{}", page("^A")), "N20^A");
        assert_eq!(format!("{}", page("v^A")), "V20^A");
        assert_eq!(format!("{}", page("7^A")), "N7^A");
        assert_eq!(format!("{}", page("H0^A")), "H0^A");
        assert_eq!(format!("{}", page("V255^")), "V255^");
    }

    #[test]
    fn lines_and_alignment() {
        let p = page("V40^12:34 FUNKYTOWN~5_Limited Express");
        assert_eq!(
            p.lines(),
            [
                Line::new("12:34 FUNKYTOWN").unwrap().with_right("5").unwrap(),
                Line::new("Limited Express").unwrap(),
            ]
        );
    }

    #[test]
    fn encoding() {
        let p = page("V40^12:34 FUNKYTOWN~5_Limited Express");
        let mut expected = vec![0x1D, 0x00, 40, 0x00];
        expected.extend_from_slice(b"12:34 FUNKYTOWN\\R5\x0ALimited Express\x0D");
        assert_eq!(p.size(), expected.len());
        assert_eq!(p.to_bytes(), expected);
    }

    #[test]
    fn leading_empty_line_is_offset() {
        let p = page("H0^_Stops all stations except East Richard");
        let bytes = p.to_bytes();
        assert_eq!(bytes[..4], [0x2F, 0x01, 0x00, 0x00]);
        assert_eq!(&bytes[4..], b"Stops all stations except East Richard\x0D");
        assert_eq!(round_trip(&p), p);
    }

    #[test]
    fn all_empty_lines() {
        let p = page("N0^_");
        assert_eq!(p.lines().len(), 2);
        assert_eq!(p.to_bytes(), [0x00, 0x01, 0x00, 0x00, 0x0D]);
        assert_eq!(round_trip(&p), p);

        let p = page("N0^");
        assert_eq!(p.to_bytes(), [0x00, 0x00, 0x00, 0x00, 0x0D]);
        assert_eq!(round_trip(&p), p);
    }

    #[test]
    fn round_trips() {
        for s in [
            "V0^OPEN_FOR BUSINESS",
            "V40^12:34 FUNKYTOWN~5_Limited Express",
            "H0^_Stops all stations except East Richard",
            "N13^~right only",
            "N255^empty right~",
            "N1^a\\~Rb",
            "N2^back\\slash_\u{2022} \u{00B7} \u{2500}\u{2501}\u{2588}\u{2594}",
            "V0^trailing space _",
        ] {
            let p = page(s);
            assert_eq!(format!("{p}"), s);
            assert_eq!(round_trip(&p), p, "{s}");
        }
    }

    #[test]
    fn terminator_byte_as_delay() {
        // A delay of 13 encodes as the page terminator byte.
        let p = page("N13^A");
        assert_eq!(round_trip(&p), p);
    }

    #[test]
    fn repeated_alignment_markers_append() {
        let p = page("N0^A~B~C");
        assert_eq!(p.lines()[0].text(), "A");
        assert_eq!(p.lines()[0].right(), Some("BC"));
        assert_eq!(format!("{p}"), "N0^A~BC");

        let mut data: &[u8] = b"\x00\x00\x00\x00A\\RB\\RC\x0D";
        assert_eq!(Page::decode(&mut data).unwrap(), p);
    }

    #[test]
    fn parse_errors() {
        assert_eq!(
            "X10^hi".parse::<Page>(),
            Err(EncodeError::UnknownAnimation('X'))
        );
        assert_eq!(
            "V256^hi".parse::<Page>(),
            Err(EncodeError::DelayOutOfRange("256".into()))
        );
        assert_eq!(
            "@@@ BAD TEXT @@@".parse::<Page>(),
            Err(EncodeError::UnsupportedCharacter('@'))
        );
        assert_eq!(
            "V0^one_two_three".parse::<Page>(),
            Err(EncodeError::TooManyLines(3))
        );
        assert_eq!(
            "V0^literal \\R".parse::<Page>(),
            Err(EncodeError::ReservedSequence)
        );
        // Not a header, so the separator is part of the text.
        assert_eq!(
            "hello ^ world".parse::<Page>(),
            Err(EncodeError::UnsupportedCharacter('^'))
        );
    }

    #[test]
    fn decode_errors() {
        fn kind(mut bytes: &[u8]) -> Result<Page, DecodeErrorKind> {
            Page::decode(&mut bytes).map_err(|e| e.kind())
        }

        assert_eq!(kind(b"\x00\x00\x00"), Err(DecodeErrorKind::UnexpectedEnd));
        assert_eq!(kind(b"\x00\x00\x00\x00A"), Err(DecodeErrorKind::UnexpectedEnd));
        assert_eq!(
            kind(b"\xFF\x00\x00\x00\x0D"),
            Err(DecodeErrorKind::UnknownAnimation(0xFF))
        );
        assert_eq!(
            kind(b"\x00\x00\x00\xFF\x0D"),
            Err(DecodeErrorKind::UnexpectedByte {
                name: "reserved",
                value: 0xFF,
                expected: &[0x00],
            })
        );
        assert_eq!(
            kind(b"\x00\x00\x00\x00\xFF\x0D"),
            Err(DecodeErrorKind::UnsupportedByte(0xFF))
        );
        assert_eq!(
            kind(b"\x00\x02\x00\x00A\x0D"),
            Err(DecodeErrorKind::TooManyLines(3))
        );
    }

    #[test]
    fn animation_lookup() {
        assert_eq!(Animation::from_letter('h'), Ok(Animation::HorizontalScroll));
        assert_eq!(Animation::from_code(0x1D), Ok(Animation::VerticalScroll));
        for animation in Animation::ALL {
            assert_eq!(Animation::from_letter(animation.letter()), Ok(animation));
            assert_eq!(Animation::from_code(animation.code()), Ok(animation));
        }
    }
}
