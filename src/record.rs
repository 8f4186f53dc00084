use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    User,
    Supervisor,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::User, Role::Supervisor];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::User => "User",
            Role::Supervisor => "Supervisor",
        }
    }

    /// Role selector order: All, Admin, User, Supervisor and around again.
    pub fn cycle(current: Option<Role>, forward: bool) -> Option<Role> {
        let options: Vec<Option<Role>> = std::iter::once(None)
            .chain(Role::ALL.iter().copied().map(Some))
            .collect();
        let pos = options.iter().position(|&r| r == current).unwrap_or(0);
        let next = if forward {
            (pos + 1) % options.len()
        } else {
            (pos + options.len() - 1) % options.len()
        };
        options[next]
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    // Exact match, the role filter is case-sensitive as well.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Admin" => Ok(Role::Admin),
            "User" => Ok(Role::User),
            "Supervisor" => Ok(Role::Supervisor),
            other => Err(format!("unknown role \"{other}\"")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: i64,
    pub name: String,
    pub age: i64,
    pub role: Role,
}

impl Record {
    pub fn new(id: i64, name: impl Into<String>, age: i64, role: Role) -> Self {
        Self {
            id,
            name: name.into(),
            age,
            role,
        }
    }

    /// String form of a single field, as shown in the table.
    pub fn field(&self, key: SortKey) -> String {
        match key {
            SortKey::Id => self.id.to_string(),
            SortKey::Name => self.name.clone(),
            SortKey::Age => self.age.to_string(),
            SortKey::Role => self.role.as_str().to_string(),
        }
    }

    pub fn fields(&self) -> [String; 4] {
        SortKey::ALL.map(|key| self.field(key))
    }

    /// Numeric order for id and age, lexicographic for name and role.
    pub fn compare(&self, other: &Record, key: SortKey) -> Ordering {
        match key {
            SortKey::Id => self.id.cmp(&other.id),
            SortKey::Name => self.name.cmp(&other.name),
            SortKey::Age => self.age.cmp(&other.age),
            SortKey::Role => self.role.as_str().cmp(other.role.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Id,
    Name,
    Age,
    Role,
}

impl SortKey {
    pub const ALL: [SortKey; 4] = [SortKey::Id, SortKey::Name, SortKey::Age, SortKey::Role];

    pub fn header(&self) -> &'static str {
        match self {
            SortKey::Id => "ID",
            SortKey::Name => "Name",
            SortKey::Age => "Age",
            SortKey::Role => "Role",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn glyph(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "↑",
            SortDirection::Descending => "↓",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parsing_is_case_sensitive() {
        assert_eq!("Admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("Supervisor".parse::<Role>(), Ok(Role::Supervisor));
        assert!("admin".parse::<Role>().is_err());
        assert!("Guest".parse::<Role>().is_err());
    }

    #[test]
    fn role_cycle_wraps_through_all() {
        assert_eq!(Role::cycle(None, true), Some(Role::Admin));
        assert_eq!(Role::cycle(Some(Role::Admin), true), Some(Role::User));
        assert_eq!(Role::cycle(Some(Role::User), true), Some(Role::Supervisor));
        assert_eq!(Role::cycle(Some(Role::Supervisor), true), None);
        assert_eq!(Role::cycle(None, false), Some(Role::Supervisor));
        assert_eq!(Role::cycle(Some(Role::Admin), false), None);
    }

    #[test]
    fn fields_in_column_order() {
        let r = Record::new(2, "Jane Smith", 30, Role::User);
        assert_eq!(r.fields(), ["2", "Jane Smith", "30", "User"]);
    }

    #[test]
    fn numeric_fields_compare_numerically() {
        let a = Record::new(9, "A", 9, Role::User);
        let b = Record::new(10, "B", 10, Role::User);
        // "10" < "9" as strings, but not as numbers
        assert_eq!(a.compare(&b, SortKey::Id), Ordering::Less);
        assert_eq!(a.compare(&b, SortKey::Age), Ordering::Less);
    }

    #[test]
    fn roles_compare_by_name() {
        let admin = Record::new(1, "A", 1, Role::Admin);
        let user = Record::new(2, "B", 2, Role::User);
        let sup = Record::new(3, "C", 3, Role::Supervisor);
        assert_eq!(sup.compare(&user, SortKey::Role), Ordering::Less);
        assert_eq!(admin.compare(&sup, SortKey::Role), Ordering::Less);
    }
}
