use crate::db::StoreError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = StoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(StoreError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

// Wire names of the remote relational store.
str_enum!(Table {
    Accounts => "usuarios",
    Workers => "trabajadores",
    LabResults => "examenes",
    Hygiene => "v_higiene",
    Appointments => "citaciones",
    DeadlineAlerts => "v_alertas",
    Directory => "v_usuarios_busqueda",
});

str_enum!(SortDirection {
    Ascending => "asc",
    Descending => "desc",
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn table_round_trips_wire_name() {
        assert_eq!(Table::from_str("examenes").unwrap(), Table::LabResults);
        assert_eq!(Table::Directory.as_str(), "v_usuarios_busqueda");
    }

    #[test]
    fn unknown_table_rejected() {
        let err = Table::from_str("pg_shadow").unwrap_err();
        assert!(err.to_string().contains("pg_shadow"));
    }
}
