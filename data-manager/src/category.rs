//! Content categories and the fixed metadata of their data files

use std::fmt;
use std::str::FromStr;

use crate::error::DataError;

/// Shape of the value a category file exports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// A single record (object)
    Record,
    /// An array of records
    List,
}

/// One content type of the portfolio, mapped 1:1 to a data file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Personal,
    Education,
    Experience,
    Skills,
    Projects,
    Travel,
    Activities,
}

/// Import path every data file pulls its types from
pub const TYPES_IMPORT_PATH: &str = "../types";

/// Fields the personal record must carry on every update
pub const PERSONAL_REQUIRED_FIELDS: [&str; 6] =
    ["name", "email", "phone", "linkedin", "title", "summary"];

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Personal,
        Category::Education,
        Category::Experience,
        Category::Skills,
        Category::Projects,
        Category::Travel,
        Category::Activities,
    ];

    /// URL segment under `/api`
    pub fn slug(self) -> &'static str {
        match self {
            Category::Personal => "personal",
            Category::Education => "education",
            Category::Experience => "experience",
            Category::Skills => "skills",
            Category::Projects => "projects",
            Category::Travel => "travel",
            Category::Activities => "activities",
        }
    }

    /// File name inside the data directory
    pub fn file_name(self) -> &'static str {
        match self {
            Category::Personal => "personalInfo.ts",
            Category::Education => "education.ts",
            Category::Experience => "experience.ts",
            Category::Skills => "skills.ts",
            Category::Projects => "projects.ts",
            Category::Travel => "travel.ts",
            Category::Activities => "activities.ts",
        }
    }

    /// File name without its extension; prefixes backup names
    pub fn base_name(self) -> &'static str {
        self.file_name().trim_end_matches(".ts")
    }

    /// Identifier of the `export const` holding the collection
    pub fn export_name(self) -> &'static str {
        match self {
            Category::Personal => "personalInfo",
            Category::Travel => "travelLocations",
            other => other.slug(),
        }
    }

    /// Element type imported from the types module
    pub fn imported_type(self) -> &'static str {
        match self {
            Category::Personal => "PersonalInfo",
            Category::Education => "Education",
            Category::Experience => "Experience",
            Category::Skills => "SkillCategory",
            Category::Projects => "Project",
            Category::Travel => "TravelLocation",
            Category::Activities => "Activity",
        }
    }

    /// Type annotation on the export, e.g. `Education[]`
    pub fn declared_type(self) -> String {
        match self.shape() {
            Shape::Record => self.imported_type().to_string(),
            Shape::List => format!("{}[]", self.imported_type()),
        }
    }

    pub fn shape(self) -> Shape {
        match self {
            Category::Personal => Shape::Record,
            _ => Shape::List,
        }
    }

    /// Human-readable name used in messages and the dashboard
    pub fn label(self) -> &'static str {
        match self {
            Category::Personal => "Personal info",
            Category::Education => "Education",
            Category::Experience => "Experience",
            Category::Skills => "Skills",
            Category::Projects => "Projects",
            Category::Travel => "Travel",
            Category::Activities => "Activities",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Category::Personal => "Contact details, title, and summary",
            Category::Education => "Academic background and achievements",
            Category::Experience => "Work history and professional roles",
            Category::Skills => "Technical skills and competencies",
            Category::Projects => "Portfolio projects and demos",
            Category::Travel => "Travel locations, photos, and experiences",
            Category::Activities => "Extracurricular activities and achievements",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Category {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.slug() == s)
            .ok_or_else(|| DataError::UnknownCategory(s.to_string()))
    }
}
