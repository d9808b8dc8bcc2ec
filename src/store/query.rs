use super::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub(crate) fn sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InsertOptions {
    /// Overwrite the row sharing the primary key instead of failing.
    pub upsert: bool,
}

impl InsertOptions {
    pub fn upsert() -> Self {
        Self { upsert: true }
    }
}

/// Equality filters (ANDed), optional ordering and limit.
#[derive(Debug, Clone, Default)]
pub struct SelectQuery {
    pub(crate) filters: Vec<(String, Value)>,
    pub(crate) order_by: Option<(String, Direction)>,
    pub(crate) limit: Option<u32>,
}

impl SelectQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push((column.to_string(), value.into()));
        self
    }

    pub fn order_by(mut self, column: &str, direction: Direction) -> Self {
        self.order_by = Some((column.to_string(), direction));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}
