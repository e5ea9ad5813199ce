//! Elastic tab stops for column output.
//!
//! Lines are split into cells at `\t`. Consecutive lines that share a column
//! form a block, and every cell of a block is padded to the widest cell in
//! it. The last cell of a line never takes part in alignment, so a line
//! without tabs ends every open block.

/// Buffers tab-separated lines and renders them aligned on [`flush`].
///
/// [`flush`]: ColumnWriter::flush
#[derive(Debug, Clone)]
pub struct ColumnWriter {
    min_width: usize,
    padding: usize,
    lines: Vec<Vec<String>>,
}

impl ColumnWriter {
    /// `min_width` is the narrowest a column can be, `padding` is added to
    /// the widest cell of each column.
    pub fn new(min_width: usize, padding: usize) -> Self {
        Self {
            min_width,
            padding,
            lines: Vec::new(),
        }
    }

    /// Buffer one line (without its newline).
    pub fn write_line(&mut self, line: &str) {
        self.lines
            .push(line.split('\t').map(str::to_string).collect());
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Render and drop everything buffered so far. Every line ends with `\n`.
    pub fn flush(&mut self) -> String {
        let mut out = String::new();
        let mut widths = Vec::new();
        self.format(&mut out, &mut widths, 0, self.lines.len());
        self.lines.clear();
        out
    }

    fn format(&self, out: &mut String, widths: &mut Vec<usize>, mut line0: usize, line1: usize) {
        let column = widths.len();
        let mut this = line0;

        while this < line1 {
            if column + 1 >= self.lines[this].len() {
                this += 1;
                continue;
            }

            // Lines before the block are finished at this depth.
            self.write_lines(out, widths, line0, this);
            line0 = this;

            let mut width = self.min_width;
            while this < line1 {
                let line = &self.lines[this];
                if column + 1 >= line.len() {
                    break;
                }
                width = width.max(cell_width(&line[column]) + self.padding);
                this += 1;
            }

            widths.push(width);
            self.format(out, widths, line0, this);
            widths.pop();
            line0 = this;
        }

        self.write_lines(out, widths, line0, line1);
    }

    fn write_lines(&self, out: &mut String, widths: &[usize], line0: usize, line1: usize) {
        for line in &self.lines[line0..line1] {
            for (j, cell) in line.iter().enumerate() {
                out.push_str(cell);
                if let Some(width) = widths.get(j) {
                    let pad = width.saturating_sub(cell_width(cell));
                    out.extend(std::iter::repeat(' ').take(pad));
                }
            }
            out.push('\n');
        }
    }
}

fn cell_width(cell: &str) -> usize {
    cell.chars().count()
}
