//! Preference lists with ties.

use std::fmt;

/// An ordered preference list whose entries may be tied.
///
/// Stored as a sequence of tie groups: every entry of a group shares one
/// rank, and the rank of the next group is the previous rank plus the size
/// of the previous group (competition ranking). `4 5 (1 2) 3` therefore
/// gives entries `[4, 5, 1, 2, 3]` the ranks `[1, 2, 3, 3, 5]`.
///
/// # Examples
///
/// ```
/// use u_matching::model::PreferenceList;
///
/// let list = PreferenceList::parse_tokens(&["4", "5", "(1", "2)", "3"]).unwrap();
/// assert_eq!(list.entries().collect::<Vec<_>>(), vec![4, 5, 1, 2, 3]);
/// assert_eq!(list.ranks(), vec![1, 2, 3, 3, 5]);
/// assert_eq!(list.to_string(), "4 5 (1 2) 3");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PreferenceList {
    groups: Vec<Vec<usize>>,
}

impl PreferenceList {
    /// Creates a list from explicit tie groups. Empty groups are dropped.
    pub fn from_groups(groups: Vec<Vec<usize>>) -> Self {
        Self {
            groups: groups.into_iter().filter(|g| !g.is_empty()).collect(),
        }
    }

    /// Creates a list without ties.
    pub fn strict(entries: impl IntoIterator<Item = usize>) -> Self {
        Self {
            groups: entries.into_iter().map(|e| vec![e]).collect(),
        }
    }

    /// Creates a list from per-entry tie indicators.
    ///
    /// `ties[i]` states that entry `i` is tied with entry `i + 1`; the
    /// indicator of the last entry has no effect. Missing indicators count
    /// as untied.
    pub fn from_tie_indicators(entries: &[usize], ties: &[bool]) -> Self {
        let mut groups = Vec::new();
        let mut current = Vec::new();
        for (i, &entry) in entries.iter().enumerate() {
            current.push(entry);
            let tied = ties.get(i).copied().unwrap_or(false);
            if !tied || i + 1 == entries.len() {
                groups.push(std::mem::take(&mut current));
            }
        }
        Self { groups }
    }

    /// Parses whitespace-separated tokens where a maximal run of tied
    /// entries is bracketed: `(2 3)`.
    pub fn parse_tokens<S: AsRef<str>>(tokens: &[S]) -> Result<Self, String> {
        let mut groups = Vec::new();
        let mut open: Option<Vec<usize>> = None;

        for token in tokens {
            let token = token.as_ref();
            let opens = token.starts_with('(');
            let closes = token.ends_with(')');
            let digits = token.trim_start_matches('(').trim_end_matches(')');
            let entry: usize = digits
                .parse()
                .map_err(|_| format!("invalid preference entry `{token}`"))?;

            match (open.take(), opens, closes) {
                (Some(_), true, _) => return Err(format!("nested tie group at `{token}`")),
                (None, false, true) => {
                    return Err(format!("tie group closed without opening at `{token}`"))
                }
                (None, true, true) | (None, false, false) => groups.push(vec![entry]),
                (None, true, false) => open = Some(vec![entry]),
                (Some(mut group), false, closes) => {
                    group.push(entry);
                    if closes {
                        groups.push(group);
                    } else {
                        open = Some(group);
                    }
                }
            }
        }

        if open.is_some() {
            return Err("unterminated tie group".into());
        }
        Ok(Self { groups })
    }

    /// Tie groups in preference order.
    pub fn groups(&self) -> &[Vec<usize>] {
        &self.groups
    }

    /// Entries in preference order.
    pub fn entries(&self) -> impl Iterator<Item = usize> + '_ {
        self.groups.iter().flatten().copied()
    }

    /// Entries paired with their ranks.
    pub fn ranked(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let mut next_rank = 1;
        self.groups.iter().flat_map(move |group| {
            let rank = next_rank;
            next_rank += group.len();
            group.iter().map(move |&entry| (entry, rank))
        })
    }

    /// Rank of every entry, aligned with [`entries`](Self::entries).
    pub fn ranks(&self) -> Vec<usize> {
        self.ranked().map(|(_, rank)| rank).collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }

    /// Whether the list ranks nothing.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Tokens of the textual form, bracketing each tie group of two or more.
    pub fn to_tokens(&self) -> Vec<String> {
        let mut tokens = Vec::with_capacity(self.len());
        for group in &self.groups {
            let last = group.len() - 1;
            for (i, entry) in group.iter().enumerate() {
                let token = match (group.len(), i) {
                    (1, _) => entry.to_string(),
                    (_, 0) => format!("({entry}"),
                    (_, i) if i == last => format!("{entry})"),
                    _ => entry.to_string(),
                };
                tokens.push(token);
            }
        }
        tokens
    }
}

impl fmt::Display for PreferenceList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_tokens().join(" "))
    }
}
