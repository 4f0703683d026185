//! Parameterized SQL statements.
//!
//! SQL text only ever comes from `&'static str` fragments; values supplied by
//! callers are carried as typed [`Param`]s and bound positionally by the
//! backend.

use chrono::NaiveDate;
use std::borrow::Cow;

#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Text(String),
    NullableText(Option<String>),
    Int(i32),
    Double(f64),
    Date(NaiveDate),
}

impl From<&str> for Param {
    fn from(s: &str) -> Self {
        Param::Text(s.to_string())
    }
}

impl From<String> for Param {
    fn from(s: String) -> Self {
        Param::Text(s)
    }
}

impl From<Option<String>> for Param {
    fn from(s: Option<String>) -> Self {
        Param::NullableText(s)
    }
}

impl From<i32> for Param {
    fn from(i: i32) -> Self {
        Param::Int(i)
    }
}

impl From<f64> for Param {
    fn from(f: f64) -> Self {
        Param::Double(f)
    }
}

impl From<NaiveDate> for Param {
    fn from(d: NaiveDate) -> Self {
        Param::Date(d)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    sql: Cow<'static, str>,
    params: Vec<Param>,
    order_by: Option<&'static str>,
    returning: bool,
}

impl Statement {
    /// A statement whose placeholders (`$1`, `$2`, ...) are already written
    /// into `sql`. Bind values in placeholder order with [`Statement::bind`].
    pub fn new(sql: &'static str) -> Self {
        Self {
            sql: Cow::Borrowed(sql),
            params: Vec::new(),
            order_by: None,
            returning: false,
        }
    }

    pub fn bind(mut self, param: impl Into<Param>) -> Self {
        self.params.push(param.into());
        self
    }

    /// Order of the returned rows, written against output column names.
    /// Applied to the outermost query, so it survives any wrapping the
    /// backend adds.
    pub fn ordered_by(mut self, order: &'static str) -> Self {
        self.order_by = Some(order);
        self
    }

    /// Marks a write whose `RETURNING` clause should come back as rows.
    pub fn returning(mut self) -> Self {
        self.returning = true;
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn order_by(&self) -> Option<&'static str> {
        self.order_by
    }

    pub fn is_returning(&self) -> bool {
        self.returning
    }
}

/// Builds a SELECT with optional `WHERE` predicates.
///
/// Each predicate is a static fragment where every `?` stands for one bound
/// value; the builder numbers them as it goes.
///
/// ```
/// use club_registry::statement::SelectBuilder;
///
/// let stmt = SelectBuilder::new("SELECT club_name FROM club c")
///     .and_where("c.club_name ILIKE ?", ["%chess%"])
///     .order_by("club_name")
///     .build();
/// assert_eq!(stmt.sql(), "SELECT club_name FROM club c WHERE (c.club_name ILIKE $1)");
/// assert_eq!(stmt.order_by(), Some("club_name"));
/// ```
#[derive(Debug, Clone)]
pub struct SelectBuilder {
    base: &'static str,
    predicates: Vec<String>,
    order_by: Option<&'static str>,
    params: Vec<Param>,
}

impl SelectBuilder {
    pub fn new(base: &'static str) -> Self {
        Self {
            base,
            predicates: Vec::new(),
            order_by: None,
            params: Vec::new(),
        }
    }

    /// Appends `fragment` joined with `AND`. Panics if the number of `?`
    /// markers does not match the number of values, which is a programming
    /// error in the calling query.
    pub fn and_where<P, I>(mut self, fragment: &'static str, values: I) -> Self
    where
        P: Into<Param>,
        I: IntoIterator<Item = P>,
    {
        let values: Vec<Param> = values.into_iter().map(Into::into).collect();
        let markers = fragment.matches('?').count();
        assert_eq!(
            markers,
            values.len(),
            "predicate `{fragment}` expects {markers} values"
        );

        let mut clause = String::with_capacity(fragment.len() + 4 * markers);
        let mut pieces = fragment.split('?');
        if let Some(first) = pieces.next() {
            clause.push_str(first);
        }
        for (piece, value) in pieces.zip(values) {
            self.params.push(value);
            clause.push_str(&format!("${}", self.params.len()));
            clause.push_str(piece);
        }

        self.predicates.push(clause);
        self
    }

    pub fn order_by(mut self, order: &'static str) -> Self {
        self.order_by = Some(order);
        self
    }

    pub fn build(self) -> Statement {
        let mut sql = String::from(self.base);
        if !self.predicates.is_empty() {
            sql.push_str(" WHERE ");
            let joined = self
                .predicates
                .iter()
                .map(|p| format!("({p})"))
                .collect::<Vec<_>>()
                .join(" AND ");
            sql.push_str(&joined);
        }
        Statement {
            sql: Cow::Owned(sql),
            params: self.params,
            order_by: self.order_by,
            returning: false,
        }
    }
}

/// Escapes `LIKE` wildcards so `text` only matches literally, then wraps it
/// for a substring match.
pub fn contains_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
