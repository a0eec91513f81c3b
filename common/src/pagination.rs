//! Cursor-based pagination primitives.
//!
//! Cursors are expected to be ordered the same way the listed nodes are, so
//! a page is a contiguous run of nodes after (or before) a cursor.

use std::fmt;

/// Page of nodes selected with some [`Arguments`].
#[derive(Clone, Debug)]
pub struct Connection<C, I> {
    /// [`Edge`]s of this [`Connection`], in ascending cursor order.
    pub edges: Vec<Edge<C, I>>,

    /// [`Kind`] of the pagination this [`Connection`] was selected with.
    pub kind: Kind,

    /// Indicator whether there are more nodes in the paginated direction.
    pub has_more: bool,
}

/// A page in a [`Connection`].
pub type Page<C, I> = Connection<C, I>;

impl<C, I> Connection<C, I> {
    /// Creates a new [`Connection`] from the provided [`Edge`]s.
    #[must_use]
    pub fn new(
        args: &Arguments<C>,
        edges: impl IntoIterator<Item = impl Into<Edge<C, I>>>,
        has_more: bool,
    ) -> Self {
        Self {
            edges: edges.into_iter().map(Into::into).collect(),
            kind: args.kind(),
            has_more,
        }
    }

    /// Creates a new [`Connection`] out of the [`Edge`]s fetched in the
    /// [`Kind::order()`] with the [`Arguments::fetch_limit()`].
    ///
    /// The extra [`Edge`] only indicates the next page and is dropped.
    /// [`Edge`]s of a backward page are reversed to ascending order.
    #[must_use]
    pub fn from_fetched(
        args: &Arguments<C>,
        fetched: impl IntoIterator<Item = impl Into<Edge<C, I>>>,
    ) -> Self {
        let mut edges = fetched
            .into_iter()
            .map(Into::into)
            .collect::<Vec<Edge<C, I>>>();
        let has_more = edges.len() > args.limit();
        edges.truncate(args.limit());
        if args.kind().is_backward() {
            edges.reverse();
        }
        Self {
            edges,
            kind: args.kind(),
            has_more,
        }
    }

    /// Returns [`PageInfo`] of this [`Connection`].
    #[must_use]
    pub fn page_info(&self) -> PageInfo<C>
    where
        C: Clone,
    {
        PageInfo {
            start_cursor: self.edges.first().map(|e| e.cursor.clone()),
            end_cursor: self.edges.last().map(|e| e.cursor.clone()),
            has_next_page: self.has_more && self.kind.is_forward(),
            has_previous_page: self.has_more && self.kind.is_backward(),
        }
    }
}

/// Information about a page in a [`Connection`].
#[derive(Clone, Copy, Debug)]
pub struct PageInfo<C> {
    /// First cursor on this page.
    pub start_cursor: Option<C>,

    /// Last cursor on this page.
    pub end_cursor: Option<C>,

    /// Indicator whether [`Connection`] has a next page.
    pub has_next_page: bool,

    /// Indicator whether [`Connection`] has a previous page.
    pub has_previous_page: bool,
}

/// An edge in a [`Connection`].
#[derive(Clone, Copy, Debug)]
pub struct Edge<C, I> {
    /// Cursor of this [`Edge`].
    pub cursor: C,

    /// Node of this [`Edge`].
    pub node: I,
}

impl<C, I> From<(C, I)> for Edge<C, I> {
    fn from((cursor, node): (C, I)) -> Self {
        Self { cursor, node }
    }
}

/// Pagination arguments.
#[derive(Clone, Copy, Debug)]
pub enum Arguments<C> {
    /// Forward pagination.
    Forward {
        /// Number of items to return.
        first: usize,

        /// Cursor after which to return items.
        after: Option<C>,

        /// Indicator whether the `after` cursor should be included in the
        /// result.
        including: bool,
    },

    /// Backward pagination.
    Backward {
        /// Number of items to return.
        last: usize,

        /// Cursor before which to return items.
        before: Option<C>,

        /// Indicator whether the `before` cursor should be included in the
        /// result.
        including: bool,
    },
}

impl<C> Arguments<C> {
    /// Maximum number of items a single page may contain.
    pub const MAX_LIMIT: usize = 100;

    /// Creates new [`Arguments`] out of the GraphQL Relay-style ones.
    ///
    /// Providing the same `after` and `before` cursors selects the node
    /// under that cursor.
    ///
    /// [`None`] is returned if the arguments are ambiguous, or request a
    /// negative or more than [`Arguments::MAX_LIMIT`] number of items.
    pub fn new<Num>(
        first: Option<Num>,
        after: Option<C>,
        last: Option<Num>,
        before: Option<C>,
        default: Num,
    ) -> Option<Self>
    where
        C: PartialEq + fmt::Debug,
        Num: TryInto<usize> + fmt::Debug,
    {
        let limit = |n: Num| {
            n.try_into().ok().filter(|n| *n <= Self::MAX_LIMIT)
        };

        Some(match (first, after, last, before) {
            (first, None, None, None) => Self::Forward {
                first: limit(first.unwrap_or(default))?,
                after: None,
                including: false,
            },
            (Some(first), Some(after), None, None) => Self::Forward {
                first: limit(first)?,
                after: Some(after),
                including: false,
            },
            (Some(first), Some(after), None, Some(before))
                if after == before =>
            {
                Self::Forward {
                    first: limit(first)?,
                    after: Some(after),
                    including: true,
                }
            }
            (None, None, Some(last), before) => Self::Backward {
                last: limit(last)?,
                before,
                including: false,
            },
            (None, Some(after), Some(last), Some(before))
                if after == before =>
            {
                Self::Backward {
                    last: limit(last)?,
                    before: Some(before),
                    including: true,
                }
            }
            (None, Some(after), None, Some(before)) if after == before => {
                Self::Forward {
                    first: 1,
                    after: Some(after),
                    including: true,
                }
            }
            _ => return None,
        })
    }

    /// Returns the exact cursor requested by these [`Arguments`], if they
    /// select a single node.
    pub fn exact_cursor(&self) -> Option<&C> {
        match self {
            Self::Forward {
                first: 1,
                after,
                including: true,
            } => after.as_ref(),
            Self::Backward {
                last: 1,
                before,
                including: true,
            } => before.as_ref(),
            Self::Forward { .. } | Self::Backward { .. } => None,
        }
    }

    /// Returns cursor requested by these [`Arguments`].
    #[must_use]
    pub fn cursor(&self) -> Option<&C> {
        match self {
            Self::Forward { after, .. } => after.as_ref(),
            Self::Backward { before, .. } => before.as_ref(),
        }
    }

    /// Returns [`Kind`] of pagination these [`Arguments`] request.
    pub fn kind(&self) -> Kind {
        match *self {
            Self::Forward { including, .. } => {
                if including {
                    Kind::ForwardIncluding
                } else {
                    Kind::Forward
                }
            }
            Self::Backward { including, .. } => {
                if including {
                    Kind::BackwardIncluding
                } else {
                    Kind::Backward
                }
            }
        }
    }

    /// Returns limit requested by these [`Arguments`].
    #[must_use]
    pub fn limit(&self) -> usize {
        match *self {
            Self::Forward { first, .. } => first,
            Self::Backward { last, .. } => last,
        }
    }

    /// Returns the number of items to fetch from a storage: one more than
    /// the [`Arguments::limit()`] to detect whether more items exist.
    #[must_use]
    pub fn fetch_limit(&self) -> i32 {
        i32::try_from(self.limit())
            .unwrap_or(i32::MAX)
            .saturating_add(1)
    }
}

/// Pagination selector.
#[derive(Clone, Copy, Debug)]
pub struct Selector<C, F> {
    /// Pagination [`Arguments`].
    pub arguments: Arguments<C>,

    /// Additional filter being applied to the result.
    pub filter: F,
}

/// Kind of pagination.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Kind {
    /// Forward pagination.
    Forward,

    /// Forward pagination including the cursor.
    ForwardIncluding,

    /// Backward pagination.
    Backward,

    /// Backward pagination including the cursor.
    BackwardIncluding,
}

impl Kind {
    /// Returns whether this [`Kind`] is forward.
    #[must_use]
    pub fn is_forward(&self) -> bool {
        matches!(self, Self::Forward | Self::ForwardIncluding)
    }

    /// Returns whether this [`Kind`] is backward.
    #[must_use]
    pub fn is_backward(&self) -> bool {
        matches!(self, Self::Backward | Self::BackwardIncluding)
    }

    /// Returns comparison operator of a cursor against the stored ones.
    #[must_use]
    pub const fn operator(&self) -> &'static str {
        match self {
            Self::Forward => ">",
            Self::ForwardIncluding => ">=",
            Self::Backward => "<",
            Self::BackwardIncluding => "<=",
        }
    }

    /// Returns [`Order`] the nodes are fetched in.
    #[must_use]
    pub const fn order(&self) -> Order {
        match self {
            Self::Forward | Self::ForwardIncluding => Order::Ascending,
            Self::Backward | Self::BackwardIncluding => Order::Descending,
        }
    }
}

/// Order of pagination.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Order {
    /// Ascending order.
    Ascending,

    /// Descending order.
    Descending,
}

impl Order {
    /// Returns SQL keyword of this [`Order`].
    #[cfg(feature = "postgres")]
    #[must_use]
    pub const fn sql(&self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// Defines pagination types of a list.
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_pagination {
    ($cursor:ty, $node:ty, $filter:ty) => {
        #[doc = "Edge of a [`Connection`]."]
        pub type Edge = $crate::pagination::Edge<$cursor, $node>;

        #[doc = "A [`Connection`] of [`$node`]s."]
        pub type Connection = $crate::pagination::Connection<$cursor, $node>;

        #[doc = "A [`Page`] of [`$node`]s."]
        pub type Page = $crate::pagination::Page<$cursor, $node>;

        #[doc = "An information about a [`Page`]."]
        pub type PageInfo = $crate::pagination::PageInfo<$cursor>;

        #[doc = "Arguments for selecting a [`Page`]."]
        pub type Arguments = $crate::pagination::Arguments<$cursor>;

        #[doc = "[`Page`] selector."]
        pub type Selector = $crate::pagination::Selector<$cursor, $filter>;
    };
}

#[cfg(test)]
mod spec {
    use super::{Arguments, Connection, Kind};

    type Args = Arguments<u32>;

    #[test]
    fn parses_relay_arguments() {
        let args = Args::new(None, None, None, None, 10).unwrap();
        assert_eq!(args.kind(), Kind::Forward);
        assert_eq!(args.limit(), 10);

        let args = Args::new(Some(5), Some(3), None, None, 10).unwrap();
        assert_eq!(args.kind(), Kind::Forward);
        assert_eq!(args.cursor(), Some(&3));

        let args = Args::new(None, None, Some(5), Some(3), 10).unwrap();
        assert_eq!(args.kind(), Kind::Backward);
        assert_eq!(args.limit(), 5);

        let args = Args::new(None, Some(7), None, Some(7), 10).unwrap();
        assert_eq!(args.exact_cursor(), Some(&7));
    }

    #[test]
    fn rejects_ambiguous_and_oversized_arguments() {
        assert!(Args::new(Some(5), None, Some(5), None, 10).is_none());
        assert!(Args::new(None, Some(1), None, Some(2), 10).is_none());
        assert!(Args::new(Some(-1), None, None, None, 10).is_none());
        assert!(Args::new(Some(101), None, None, None, 10).is_none());
        assert!(Args::new(Some(100), None, None, None, 10).is_some());
    }

    #[test]
    fn detects_more_pages_on_fetched() {
        let args = Args::new(Some(2), None, None, None, 10).unwrap();
        assert_eq!(args.fetch_limit(), 3);

        let page = Connection::<u32, u32>::from_fetched(
            &args,
            [(1, 1), (2, 2), (3, 3)],
        );
        let info = page.page_info();
        assert_eq!(page.edges.len(), 2);
        assert!(info.has_next_page);
        assert!(!info.has_previous_page);
        assert_eq!(info.end_cursor, Some(2));

        let page = Connection::<u32, u32>::from_fetched(&args, [(1, 1)]);
        assert!(!page.page_info().has_next_page);
    }

    #[test]
    fn orders_backward_page_ascending() {
        let args = Args::new(None, None, Some(2), Some(9), 10).unwrap();

        let page = Connection::<u32, u32>::from_fetched(
            &args,
            [(8, 8), (7, 7), (6, 6)],
        );
        let cursors = page.edges.iter().map(|e| e.cursor).collect::<Vec<_>>();
        assert_eq!(cursors, [7, 8]);

        let info = page.page_info();
        assert!(info.has_previous_page);
        assert_eq!(info.start_cursor, Some(7));
    }
}
