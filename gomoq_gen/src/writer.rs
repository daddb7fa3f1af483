/// Something that renders itself as Go source.
pub trait ToGo {
    fn to_go(&self, dst: &mut GoWriter);

    fn to_go_string(&self) -> String {
        let mut dst = GoWriter::new();
        self.to_go(&mut dst);
        dst.finish()
    }
}

impl<T: ToGo> ToGo for [T] {
    fn to_go(&self, dst: &mut GoWriter) {
        for item in self {
            item.to_go(dst);
        }
    }
}

impl<T: ToGo> ToGo for Vec<T> {
    fn to_go(&self, dst: &mut GoWriter) {
        self.as_slice().to_go(dst)
    }
}

/// Line-oriented buffer with gofmt's tab indentation.
#[derive(Debug, Default)]
pub struct GoWriter {
    buf: String,
    indent: usize,
}

impl GoWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..self.indent {
                self.buf.push('\t');
            }
            self.buf.push_str(text);
        }
        self.buf.push('\n');
    }

    pub fn blank(&mut self) {
        self.buf.push('\n');
    }

    /// Writes `open`, the body one level deeper and `close`.
    pub fn block(&mut self, open: impl AsRef<str>, close: &str, body: impl FnOnce(&mut Self)) {
        self.line(open);
        self.indent += 1;
        body(self);
        self.indent -= 1;
        self.line(close);
    }

    pub fn finish(self) -> String {
        self.buf
    }
}

/// `go!(dst, "format", args..)` writes one formatted line.
macro_rules! go {
    ($dst:expr, $($arg:tt)*) => {
        $dst.line(format!($($arg)*))
    };
}

pub(crate) use go;

/// Pads the first column of `rows` the way gofmt aligns struct fields and
/// composite literal keys.
pub fn align(rows: &[(String, String)]) -> Vec<String> {
    let width = rows.iter().map(|(left, _)| left.len()).max().unwrap_or(0);
    rows.iter()
        .map(|(left, right)| format!("{left:width$} {right}"))
        .collect()
}
