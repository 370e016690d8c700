pub trait StatusText {
    fn as_str(&self) -> &'static str;
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Cancelled;

impl StatusText for Cancelled {
    fn as_str(&self) -> &'static str {
        "Cancelled"
    }
}
