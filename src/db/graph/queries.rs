//! Cypher templates used by the recommendation engine.
//!
//! Every template declares the parameters it binds and the columns it returns.
//! [`validate_all`] runs at startup so a broken template stops the process
//! before it serves traffic.

use crate::error::{AppError, AppResult};

/// Expected type of a returned column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Bool,
    Int,
    Text,
    IntList,
    Node,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

const fn col(name: &'static str, kind: ColumnKind) -> Column {
    Column { name, kind }
}

/// A parametrized Cypher query with its declared parameters and return columns
#[derive(Debug, PartialEq, Eq)]
pub struct CypherQuery {
    name: &'static str,
    text: &'static str,
    params: &'static [&'static str],
    columns: &'static [Column],
}

impl CypherQuery {
    pub const fn new(
        name: &'static str,
        text: &'static str,
        params: &'static [&'static str],
        columns: &'static [Column],
    ) -> Self {
        Self {
            name,
            text,
            params,
            columns,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn text(&self) -> &'static str {
        self.text
    }

    pub fn params(&self) -> &'static [&'static str] {
        self.params
    }

    pub fn columns(&self) -> &'static [Column] {
        self.columns
    }

    /// Checks the template for structural mistakes
    pub fn validate(&self) -> AppResult<()> {
        let fail = |reason: String| AppError::InvalidQuery(format!("{}: {}", self.name, reason));

        if let Some(c) = self
            .text
            .chars()
            .find(|c| c.is_control() && !matches!(*c, '\n' | '\r' | '\t'))
        {
            return Err(fail(format!("control character {:?}", c)));
        }

        let mut stack = Vec::new();
        for c in self.text.chars() {
            match c {
                '(' | '[' | '{' => stack.push(c),
                ')' | ']' | '}' => {
                    let open = match c {
                        ')' => '(',
                        ']' => '[',
                        _ => '{',
                    };
                    if stack.pop() != Some(open) {
                        return Err(fail(format!("unbalanced `{}`", c)));
                    }
                }
                _ => {}
            }
        }
        if let Some(open) = stack.pop() {
            return Err(fail(format!("unclosed `{}`", open)));
        }

        let used = referenced_params(self.text);
        for name in &used {
            if !self.params.contains(name) {
                return Err(fail(format!("undeclared parameter ${}", name)));
            }
        }
        for name in self.params {
            if !used.contains(name) {
                return Err(fail(format!("declared parameter ${} is never used", name)));
            }
        }

        let returns = self
            .text
            .rfind("RETURN")
            .map(|idx| &self.text[idx..])
            .ok_or_else(|| fail("missing RETURN clause".to_string()))?;
        for column in self.columns {
            if !returns.contains(column.name) {
                return Err(fail(format!("column `{}` not returned", column.name)));
            }
        }

        Ok(())
    }
}

fn referenced_params(text: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = text;
    while let Some(idx) = rest.find('$') {
        let tail = &rest[idx + 1..];
        let end = tail
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(tail.len());
        if end > 0 && !names.contains(&&tail[..end]) {
            names.push(&tail[..end]);
        }
        rest = &tail[end..];
    }
    names
}

/// Existence check for any rating by the student; never fetches the rated courses
pub const HAS_RATED: CypherQuery = CypherQuery::new(
    "has_rated",
    r#"
    RETURN EXISTS {
        MATCH (:Student { id: $studentId })-[:RATED]->(:Course)
    } AS hasRated
    "#,
    &["studentId"],
    &[col("hasRated", ColumnKind::Bool)],
);

/// Candidate courses sharing a category with something the student rated.
/// One row per (candidate, category); `weight` counts the connecting rated courses.
pub const CONTENT_BASED: CypherQuery = CypherQuery::new(
    "content_based",
    r#"
    MATCH (s:Student { id: $studentId })-[:RATED]->(rated:Course)
    WITH collect(rated) AS ratedCourses, collect(rated.id) AS ratedIds
    UNWIND ratedCourses AS c
    MATCH (c)-[:IN_CATEGORY]->(category:Category)<-[:IN_CATEGORY]-(rec:Course)
    WHERE NOT rec.id IN ratedIds
    RETURN rec, category.name AS category, count(*) AS weight, ratedIds
    "#,
    &["studentId"],
    &[
        col("rec", ColumnKind::Node),
        col("category", ColumnKind::Text),
        col("weight", ColumnKind::Int),
        col("ratedIds", ColumnKind::IntList),
    ],
);

/// Courses taken by peers who share at least one enrollment with the student
pub const CO_ENROLLMENT: CypherQuery = CypherQuery::new(
    "co_enrollment",
    r#"
    MATCH (s:Student { id: $studentId })-[:ENROLLED]->(:Course)<-[:ENROLLED]-(peer:Student)
    WHERE peer <> s
    WITH DISTINCT s, peer
    MATCH (peer)-[:ENROLLED]->(rec:Course)
    WHERE NOT (s)-[:ENROLLED]->(rec)
    WITH rec, count(DISTINCT peer) AS peers
    ORDER BY peers DESC, rec.id ASC
    LIMIT $limit
    RETURN rec, peers
    "#,
    &["studentId", "limit"],
    &[col("rec", ColumnKind::Node), col("peers", ColumnKind::Int)],
);

/// Category of a course the student is enrolled in or has rated
pub const STUDENT_CATEGORY: CypherQuery = CypherQuery::new(
    "student_category",
    r#"
    MATCH (:Student { id: $studentId })-[:ENROLLED|RATED]->(c:Course)-[:IN_CATEGORY]->(category:Category)
    RETURN category, c.id AS courseId
    ORDER BY courseId ASC
    LIMIT 1
    "#,
    &["studentId"],
    &[
        col("category", ColumnKind::Node),
        col("courseId", ColumnKind::Int),
    ],
);

/// Category of a single course
pub const COURSE_CATEGORY: CypherQuery = CypherQuery::new(
    "course_category",
    r#"
    MATCH (:Course { id: $courseId })-[:IN_CATEGORY]->(category:Category)
    RETURN category
    LIMIT 1
    "#,
    &["courseId"],
    &[col("category", ColumnKind::Node)],
);

/// Courses in a category, in store order
pub const CATEGORY_COURSES: CypherQuery = CypherQuery::new(
    "category_courses",
    r#"
    MATCH (c:Course)-[:IN_CATEGORY]->(:Category { id: $categoryId })
    RETURN c
    LIMIT $limit
    "#,
    &["categoryId", "limit"],
    &[col("c", ColumnKind::Node)],
);

/// Courses in a category the student has neither rated nor enrolled in
pub const UNSEEN_CATEGORY_COURSES: CypherQuery = CypherQuery::new(
    "unseen_category_courses",
    r#"
    MATCH (c:Course)-[:IN_CATEGORY]->(:Category { id: $categoryId })
    WHERE NOT EXISTS {
        MATCH (:Student { id: $studentId })-[:RATED|ENROLLED]->(c)
    }
    RETURN c
    LIMIT $limit
    "#,
    &["categoryId", "studentId", "limit"],
    &[col("c", ColumnKind::Node)],
);

pub const ALL: &[&CypherQuery] = &[
    &HAS_RATED,
    &CONTENT_BASED,
    &CO_ENROLLMENT,
    &STUDENT_CATEGORY,
    &COURSE_CATEGORY,
    &CATEGORY_COURSES,
    &UNSEEN_CATEGORY_COURSES,
];

/// Validates every template the service ships with
pub fn validate_all() -> AppResult<()> {
    for query in ALL {
        query.validate()?;
    }
    tracing::debug!(count = ALL.len(), "Query templates validated");
    Ok(())
}
