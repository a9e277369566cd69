use std::ops::Bound;

/// LazySegmentTreeの操作が失敗したときのエラー
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeError {
    /// 長さ`len`の列に対するノード配列を確保できなかった.
    Construction { len: usize },
    /// 区間`[left, right]`が`0..len`に含まれないか, `left > right`である.
    /// 一点に対する操作では`left == right`になる.
    OutOfRange { left: usize, right: usize, len: usize },
    /// `RangeBounds`で渡された区間`start..end`が`0..len`に含まれない.
    RangeOutOfBounds {
        start: Bound<usize>,
        end: Bound<usize>,
        len: usize,
    },
}

impl std::fmt::Display for TreeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::Construction { len } => {
                write!(f, "cannot allocate nodes for a sequence of length {len}")
            }
            Self::OutOfRange { left, right, len } if left == right => {
                write!(f, "index {left} is out of range for length {len}")
            }
            Self::OutOfRange { left, right, len } => {
                write!(f, "range [{left}, {right}] is out of range for length {len}")
            }
            Self::RangeOutOfBounds { start, end, len } => {
                f.write_str("range ")?;
                match start {
                    Bound::Included(i) => write!(f, "{i}")?,
                    Bound::Excluded(i) => write!(f, "{i}<")?,
                    Bound::Unbounded => {}
                }
                f.write_str("..")?;
                match end {
                    Bound::Included(i) => write!(f, "={i}")?,
                    Bound::Excluded(i) => write!(f, "{i}")?,
                    Bound::Unbounded => {}
                }
                write!(f, " is out of range for length {len}")
            }
        }
    }
}

impl std::error::Error for TreeError {}
