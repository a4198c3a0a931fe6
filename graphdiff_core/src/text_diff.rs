use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Characters that separate words in word mode
pub const WORD_DELIMITERS: [char; 5] = [' ', '.', ',', ';', '-'];

/// One run of changes: `deleted_a` items removed at `start_a`, `inserted_b`
/// items inserted from `start_b`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditItem {
    pub start_a: usize,
    pub start_b: usize,
    pub deleted_a: usize,
    pub inserted_b: usize,
}

/// Normalisation applied to lines before they are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineDiffOptions {
    /// Strip leading and trailing whitespace
    pub trim_space: bool,
    /// Collapse whitespace runs to a single space
    pub ignore_space: bool,
    pub ignore_case: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Unchanged,
    Deleted,
    Inserted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub kind: SegmentKind,
    pub text: String,
}

/// Result of a line or word diff, in left-to-right order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextDifferences {
    pub segments: Vec<Segment>,
    pub additions: Vec<String>,
    pub deletions: Vec<String>,
    pub unchanged: Vec<String>,
}

impl TextDifferences {
    pub fn has_changes(&self) -> bool {
        !self.additions.is_empty() || !self.deletions.is_empty()
    }

    fn from_edits(a: &[String], b: &[String], edits: &[EditItem]) -> Self {
        let mut result = TextDifferences::default();
        let mut pos_a = 0;

        for edit in edits {
            for token in &a[pos_a..edit.start_a] {
                result.push(SegmentKind::Unchanged, token);
            }
            for token in &a[edit.start_a..edit.start_a + edit.deleted_a] {
                result.push(SegmentKind::Deleted, token);
            }
            for token in &b[edit.start_b..edit.start_b + edit.inserted_b] {
                result.push(SegmentKind::Inserted, token);
            }
            pos_a = edit.start_a + edit.deleted_a;
        }
        for token in &a[pos_a..] {
            result.push(SegmentKind::Unchanged, token);
        }

        result
    }

    fn push(&mut self, kind: SegmentKind, token: &str) {
        let bucket = match kind {
            SegmentKind::Unchanged => &mut self.unchanged,
            SegmentKind::Deleted => &mut self.deletions,
            SegmentKind::Inserted => &mut self.additions,
        };
        bucket.push(token.to_string());
        self.segments.push(Segment {
            kind,
            text: token.to_string(),
        });
    }
}

/// Word-level additions and deletions, the delta attached to string differences
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordDifferences {
    pub additions: Vec<String>,
    pub deletions: Vec<String>,
}

impl WordDifferences {
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.deletions.is_empty()
    }
}

impl From<TextDifferences> for WordDifferences {
    fn from(diff: TextDifferences) -> Self {
        Self {
            additions: diff.additions,
            deletions: diff.deletions,
        }
    }
}

impl fmt::Display for WordDifferences {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for addition in &self.additions {
            writeln!(f, "+{}", addition)?;
        }
        for deletion in &self.deletions {
            writeln!(f, "-{}", deletion)?;
        }
        Ok(())
    }
}

/// Line and word diff engine built on the Myers O(ND) algorithm
#[derive(Debug, Clone, Default)]
pub struct TextDiffEngine {
    options: LineDiffOptions,
}

impl TextDiffEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: LineDiffOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> LineDiffOptions {
        self.options
    }

    /// Compare two texts line by line. `\r` is dropped before splitting.
    pub fn diff_lines(&self, left: &str, right: &str) -> TextDifferences {
        let a = split_lines(left);
        let b = split_lines(right);

        let mut table = TokenTable::default();
        let codes_a = table.encode(a.iter().map(|line| normalize_line(line, &self.options)));
        let codes_b = table.encode(b.iter().map(|line| normalize_line(line, &self.options)));

        let edits = diff_sequences(&codes_a, &codes_b);
        TextDifferences::from_edits(&a, &b, &edits)
    }

    /// Compare two texts word by word. Only `ignore_case` applies in word mode.
    pub fn diff_words_full(&self, left: &str, right: &str) -> TextDifferences {
        let a = split_words(left);
        let b = split_words(right);

        let ignore_case = self.options.ignore_case;
        let fold = |word: &String| {
            if ignore_case {
                word.to_lowercase()
            } else {
                word.clone()
            }
        };

        let mut table = TokenTable::default();
        let codes_a = table.encode(a.iter().map(fold));
        let codes_b = table.encode(b.iter().map(fold));

        let edits = diff_sequences(&codes_a, &codes_b);
        TextDifferences::from_edits(&a, &b, &edits)
    }

    pub fn diff_words(&self, left: &str, right: &str) -> WordDifferences {
        self.diff_words_full(left, right).into()
    }
}

pub fn diff_lines(left: &str, right: &str) -> TextDifferences {
    TextDiffEngine::new().diff_lines(left, right)
}

pub fn diff_lines_with(left: &str, right: &str, options: LineDiffOptions) -> TextDifferences {
    TextDiffEngine::with_options(options).diff_lines(left, right)
}

pub fn diff_words(left: &str, right: &str, ignore_case: bool) -> WordDifferences {
    TextDiffEngine::with_options(LineDiffOptions {
        ignore_case,
        ..LineDiffOptions::default()
    })
    .diff_words(left, right)
}

/// Edit script between two integer sequences
pub fn diff_ints(a: &[i32], b: &[i32]) -> Vec<EditItem> {
    diff_sequences(a, b)
}

/// Edit script between any two sequences of comparable items
pub fn diff_sequences<T: PartialEq>(a: &[T], b: &[T]) -> Vec<EditItem> {
    let mut myers = Myers::new(a, b);
    myers.longest_common_subsequence(0, a.len(), 0, b.len());
    myers.edits()
}

fn split_lines(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    text.replace('\r', "")
        .split('\n')
        .map(str::to_string)
        .collect()
}

fn split_words(text: &str) -> Vec<String> {
    text.split(WORD_DELIMITERS)
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect()
}

fn normalize_line(line: &str, options: &LineDiffOptions) -> String {
    let mut line = line.to_string();
    if options.trim_space {
        line = line.trim().to_string();
    }
    if options.ignore_space {
        line = WHITESPACE_RUN.replace_all(&line, " ").into_owned();
    }
    if options.ignore_case {
        line = line.to_lowercase();
    }
    line
}

/// Maps distinct tokens to codes in first-seen order, shared by both sides
#[derive(Default)]
struct TokenTable {
    codes: HashMap<String, u32>,
}

impl TokenTable {
    fn encode<I>(&mut self, tokens: I) -> Vec<u32>
    where
        I: IntoIterator<Item = String>,
    {
        tokens
            .into_iter()
            .map(|token| {
                let next = self.codes.len() as u32;
                *self.codes.entry(token).or_insert(next)
            })
            .collect()
    }
}

/// Divide-and-conquer LCS with shortest-middle-snake search
struct Myers<'a, T> {
    a: &'a [T],
    b: &'a [T],
    modified_a: Vec<bool>,
    modified_b: Vec<bool>,
    down: Vec<isize>,
    up: Vec<isize>,
}

impl<'a, T: PartialEq> Myers<'a, T> {
    fn new(a: &'a [T], b: &'a [T]) -> Self {
        let max = a.len() + b.len() + 1;
        Self {
            a,
            b,
            modified_a: vec![false; a.len()],
            modified_b: vec![false; b.len()],
            down: vec![0; 2 * max + 2],
            up: vec![0; 2 * max + 2],
        }
    }

    fn longest_common_subsequence(
        &mut self,
        mut lower_a: usize,
        mut upper_a: usize,
        mut lower_b: usize,
        mut upper_b: usize,
    ) {
        while lower_a < upper_a && lower_b < upper_b && self.a[lower_a] == self.b[lower_b] {
            lower_a += 1;
            lower_b += 1;
        }
        while lower_a < upper_a && lower_b < upper_b && self.a[upper_a - 1] == self.b[upper_b - 1]
        {
            upper_a -= 1;
            upper_b -= 1;
        }

        if lower_a == upper_a {
            self.modified_b[lower_b..upper_b].fill(true);
        } else if lower_b == upper_b {
            self.modified_a[lower_a..upper_a].fill(true);
        } else {
            match self.middle_snake(lower_a, upper_a, lower_b, upper_b) {
                Some((x, y)) => {
                    self.longest_common_subsequence(lower_a, x, lower_b, y);
                    self.longest_common_subsequence(x, upper_a, y, upper_b);
                }
                None => {
                    self.modified_a[lower_a..upper_a].fill(true);
                    self.modified_b[lower_b..upper_b].fill(true);
                }
            }
        }
    }

    /// Find the point where the forward and reverse D-paths of the
    /// subrange meet
    fn middle_snake(
        &mut self,
        lower_a: usize,
        upper_a: usize,
        lower_b: usize,
        upper_b: usize,
    ) -> Option<(usize, usize)> {
        let max = (self.a.len() + self.b.len() + 1) as isize;
        let (la, ua) = (lower_a as isize, upper_a as isize);
        let (lb, ub) = (lower_b as isize, upper_b as isize);

        let down_k = la - lb;
        let up_k = ua - ub;
        let odd_delta = ((ua - la) - (ub - lb)) & 1 != 0;
        let down_offset = max - down_k;
        let up_offset = max - up_k;
        let max_d = (ua - la + ub - lb) / 2 + 1;

        let at = |offset: isize, k: isize| (offset + k) as usize;

        self.down[at(down_offset, down_k + 1)] = la;
        self.up[at(up_offset, up_k - 1)] = ua;

        for d in 0..=max_d {
            // forward path
            let mut k = down_k - d;
            while k <= down_k + d {
                let mut x = if k == down_k - d {
                    self.down[at(down_offset, k + 1)]
                } else {
                    let right = self.down[at(down_offset, k - 1)] + 1;
                    let below = self.down[at(down_offset, k + 1)];
                    if k < down_k + d && below >= right {
                        below
                    } else {
                        right
                    }
                };
                let mut y = x - k;
                while x < ua && y < ub && self.a[x as usize] == self.b[y as usize] {
                    x += 1;
                    y += 1;
                }
                self.down[at(down_offset, k)] = x;

                if odd_delta
                    && up_k - d < k
                    && k < up_k + d
                    && self.up[at(up_offset, k)] <= self.down[at(down_offset, k)]
                {
                    return Some((x as usize, (x - k) as usize));
                }
                k += 2;
            }

            // reverse path
            let mut k = up_k - d;
            while k <= up_k + d {
                let mut x = if k == up_k + d {
                    self.up[at(up_offset, k - 1)]
                } else {
                    let left = self.up[at(up_offset, k + 1)] - 1;
                    let above = self.up[at(up_offset, k - 1)];
                    if k > up_k - d && above < left {
                        above
                    } else {
                        left
                    }
                };
                let mut y = x - k;
                while x > la && y > lb && self.a[(x - 1) as usize] == self.b[(y - 1) as usize] {
                    x -= 1;
                    y -= 1;
                }
                self.up[at(up_offset, k)] = x;

                if !odd_delta
                    && down_k - d <= k
                    && k <= down_k + d
                    && self.up[at(up_offset, k)] <= self.down[at(down_offset, k)]
                {
                    let x = self.down[at(down_offset, k)];
                    return Some((x as usize, (x - k) as usize));
                }
                k += 2;
            }
        }

        None
    }

    /// Collapse the modified flags into edit runs
    fn edits(&self) -> Vec<EditItem> {
        let (len_a, len_b) = (self.a.len(), self.b.len());
        let mut edits = Vec::new();
        let (mut line_a, mut line_b) = (0, 0);

        while line_a < len_a || line_b < len_b {
            if line_a < len_a
                && !self.modified_a[line_a]
                && line_b < len_b
                && !self.modified_b[line_b]
            {
                line_a += 1;
                line_b += 1;
                continue;
            }

            let (start_a, start_b) = (line_a, line_b);
            while line_a < len_a && (line_b >= len_b || self.modified_a[line_a]) {
                line_a += 1;
            }
            while line_b < len_b && (line_a >= len_a || self.modified_b[line_b]) {
                line_b += 1;
            }

            if start_a < line_a || start_b < line_b {
                edits.push(EditItem {
                    start_a,
                    start_b,
                    deleted_a: line_a - start_a,
                    inserted_b: line_b - start_b,
                });
            }
        }

        edits
    }
}
