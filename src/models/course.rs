use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub type StudentId = i64;
pub type CourseId = i64;
pub type CategoryId = i64;

/// Property map of a graph node, kept opaque apart from the keys we read.
pub type PropertyMap = serde_json::Map<String, serde_json::Value>;

/// Node property holding the course title in the graph schema
const TITLE_PROPERTY: &str = "courseTitle";

/// A course as returned to clients and stored in the cache
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Course {
    pub id: CourseId,
    pub title: Option<String>,
    /// Remaining display properties, passed through untouched
    #[serde(default)]
    pub properties: PropertyMap,
}

impl Course {
    pub fn new(id: CourseId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: Some(title.into()),
            properties: PropertyMap::new(),
        }
    }

    /// Builds a course from a `Course` node's properties.
    ///
    /// The `id` property must be an integer; everything else is optional.
    pub fn from_properties(mut props: PropertyMap) -> AppResult<Self> {
        let id = take_id(&mut props, "Course")?;
        let title = match props.remove(TITLE_PROPERTY) {
            Some(serde_json::Value::String(title)) => Some(title),
            Some(other) => Some(other.to_string()),
            None => None,
        };

        Ok(Self {
            id,
            title,
            properties: props,
        })
    }
}

/// A course category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

impl Category {
    /// Builds a category from a `Category` node's properties
    pub fn from_properties(mut props: PropertyMap) -> AppResult<Self> {
        let id = take_id(&mut props, "Category")?;
        let name = props
            .remove("name")
            .and_then(|v| v.as_str().map(str::to_string))
            .ok_or_else(|| {
                AppError::MalformedRecord(format!("Category {} has no name property", id))
            })?;

        Ok(Self { id, name })
    }
}

fn take_id(props: &mut PropertyMap, label: &str) -> AppResult<i64> {
    props
        .remove("id")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| AppError::MalformedRecord(format!("{} node has no integer id", label)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(value: serde_json::Value) -> PropertyMap {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_course_from_properties_keeps_display_fields() {
        let course = Course::from_properties(props(json!({
            "id": 20,
            "courseTitle": "Linear Algebra",
            "level": "intermediate"
        })))
        .unwrap();

        assert_eq!(course.id, 20);
        assert_eq!(course.title.as_deref(), Some("Linear Algebra"));
        assert_eq!(course.properties.get("level"), Some(&json!("intermediate")));
        assert!(!course.properties.contains_key("id"));
    }

    #[test]
    fn test_course_large_id_is_exact() {
        let course = Course::from_properties(props(json!({ "id": 9_007_199_254_740_993i64 }))).unwrap();
        assert_eq!(course.id, 9_007_199_254_740_993);
        assert_eq!(course.title, None);
    }

    #[test]
    fn test_course_without_id_is_malformed() {
        let err = Course::from_properties(props(json!({ "courseTitle": "Orphan" }))).unwrap_err();
        assert!(matches!(err, AppError::MalformedRecord(_)));
    }

    #[test]
    fn test_category_requires_name() {
        let err = Category::from_properties(props(json!({ "id": 3 }))).unwrap_err();
        assert!(matches!(err, AppError::MalformedRecord(_)));

        let category = Category::from_properties(props(json!({ "id": 3, "name": "Math" }))).unwrap();
        assert_eq!(category, Category { id: 3, name: "Math".to_string() });
    }

    #[test]
    fn test_course_serde_shape() {
        let course = Course::new(10, "Calculus I");
        let json = serde_json::to_value(&course).unwrap();
        assert_eq!(json, json!({ "id": 10, "title": "Calculus I", "properties": {} }));

        let back: Course = serde_json::from_value(json).unwrap();
        assert_eq!(back, course);
    }
}
