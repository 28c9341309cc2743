use std::sync::Arc;

type Pos = usize;

/// A [`SourceInfo`] maintains location data for parsed objects.
/// Keeps the filename (if read from a file) and the text that was parsed,
/// and converts byte positions in that text to a [`LineCol`].
#[derive(Clone, Debug)]
pub struct SourceInfo {
    source: Source,
    contents: Arc<str>,
    linelens: Arc<LineLens>,
}

impl SourceInfo {
    pub fn unknown() -> SourceInfo {
        SourceInfo {
            source: Source::Unknown,
            contents: Arc::from(""),
            linelens: Arc::new(LineLens::from("")),
        }
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }

    pub fn from_file(filepath: &std::path::Path, contents: &str) -> SourceInfo {
        SourceInfo {
            source: Source::File(Arc::new(filepath.to_owned())),
            contents: Arc::from(contents),
            linelens: Arc::new(LineLens::from(contents)),
        }
    }

    pub fn from_string(contents: &str) -> SourceInfo {
        SourceInfo {
            source: Source::String,
            contents: Arc::from(contents),
            linelens: Arc::new(LineLens::from(contents)),
        }
    }
}

#[derive(Clone, Debug)]
pub enum Source {
    File(Arc<std::path::PathBuf>),
    String,
    Unknown,
}

/// A [`LineCol`] is a container for a line and column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineCol(usize, usize);

impl LineCol {
    /// The line number. Starts with line 1.
    pub fn line(&self) -> usize {
        self.0 + 1
    }

    /// The column. Starts with column 1.
    pub fn col(&self) -> usize {
        self.1 + 1
    }
}

impl std::fmt::Display for LineCol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{}:{}", self.line(), self.col())
    }
}

/// A [`Loc`] tracks the span of a syntax node or token.
#[derive(Clone)]
pub struct Loc {
    start: Pos,
    end: Pos,
    source_info: SourceInfo,
}

impl std::fmt::Debug for Loc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        match &self.source_info.source {
            Source::File(path) => write!(f, "[{}-{}:{:?}]", self.start(), self.end(), path),
            Source::String => write!(f, "[{}-{}:{:?}]", self.start(), self.end(), self.text()),
            Source::Unknown => write!(f, "[{}-{}]", self.start(), self.end()),
        }
    }
}

impl std::fmt::Display for Loc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        match &self.source_info.source {
            Source::File(path) => write!(f, "{}:{}", path.display(), self.start()),
            Source::String => write!(f, "{}", self.start()),
            Source::Unknown => write!(f, "?"),
        }
    }
}

impl Loc {
    /// When the location of something is unknown, you can use this.
    pub fn unknown() -> Loc {
        Loc {
            start: 0,
            end: 0,
            source_info: SourceInfo::unknown(),
        }
    }

    pub fn from(source_info: &SourceInfo, start: usize, end: usize) -> Loc {
        Loc {
            start,
            end,
            source_info: source_info.clone(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self.source_info.source, Source::Unknown)
    }

    /// A span covering `self` through the end of `other`.
    /// Both must come from the same source.
    pub fn to(&self, other: &Loc) -> Loc {
        if self.is_unknown() {
            other.clone()
        } else if other.is_unknown() {
            self.clone()
        } else {
            Loc {
                start: self.start.min(other.start),
                end: self.end.max(other.end),
                source_info: self.source_info.clone(),
            }
        }
    }

    /// The start of the span.
    pub fn start(&self) -> LineCol {
        self.source_info.linelens.linecol(self.start)
    }

    /// The end of the span.
    pub fn end(&self) -> LineCol {
        self.source_info.linelens.linecol(self.end)
    }

    pub fn byte_range(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }

    /// The source text covered by this span.
    pub fn text(&self) -> &str {
        self.source_info.contents.get(self.start..self.end).unwrap_or("")
    }
}

/// Many objects have location information.
/// [`HasLoc`] allows you to call [`HasLoc::loc`] to get the span information.
pub trait HasLoc {
    fn loc(&self) -> Option<Loc>;
}

#[derive(Clone, Debug)]
struct LineLens(Vec<usize>);

impl LineLens {
    fn from(text: &str) -> LineLens {
        let mut lens = vec![];
        for line in text.split('\n') {
            lens.push(line.len() + 1);
        }
        LineLens(lens)
    }

    fn linecol(&self, pos: Pos) -> LineCol {
        let mut line = 0;
        let mut col = pos;
        for line_len in &self.0 {
            if col >= *line_len {
                col -= *line_len;
                line += 1;
            } else {
                break
            }
        }
        LineCol(line, col)
    }
}

#[test]
fn linelens() {
    let text = "module top;
  wire a;
endmodule";

    let linelens = LineLens::from(text);
    assert_eq!(linelens.linecol(0).to_string(), "1:1".to_string());
    assert_eq!(linelens.linecol(7).to_string(), "1:8".to_string());
    assert_eq!(linelens.linecol(11).to_string(), "1:12".to_string());
    assert_eq!(linelens.linecol(12).to_string(), "2:1".to_string());
    assert_eq!(linelens.linecol(14).to_string(), "2:3".to_string());
    assert_eq!(linelens.linecol(22).to_string(), "3:1".to_string());
}

#[test]
fn loc_text_and_join() {
    let source_info = SourceInfo::from_string("assign y = a + b;");
    let a = Loc::from(&source_info, 11, 12);
    let b = Loc::from(&source_info, 15, 16);
    assert_eq!(a.text(), "a");
    assert_eq!(a.to(&b).text(), "a + b");
    assert_eq!(Loc::unknown().to(&b).text(), "b");
    assert!(Loc::unknown().is_unknown());
}
