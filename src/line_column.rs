#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    pub fn shift_column(&self, amount: usize) -> Self {
        Self {
            line: self.line,
            column: self.column + amount,
        }
    }
}
