//! Shared domain enums, stored as their label text

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{
    encode::IsNull,
    error::BoxDynError,
    postgres::{PgArgumentBuffer, PgTypeInfo, PgValueRef},
    Decode, Encode, Postgres,
};
use utoipa::ToSchema;

/// Days before the due date at which an active loan is reported as "Due Soon"
pub const DUE_SOON_DAYS: i64 = 3;

/// Declares a closed set of labels with serde, OpenAPI and Postgres text codecs.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $label:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok($name::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($name), s)),
                }
            }
        }

        impl sqlx::Type<Postgres> for $name {
            fn type_info() -> PgTypeInfo {
                <String as sqlx::Type<Postgres>>::type_info()
            }

            fn compatible(ty: &PgTypeInfo) -> bool {
                <String as sqlx::Type<Postgres>>::compatible(ty)
            }
        }

        impl<'r> Decode<'r, Postgres> for $name {
            fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
                let s: &str = Decode::<Postgres>::decode(value)?;
                s.parse().map_err(|e: String| e.into())
            }
        }

        impl Encode<'_, Postgres> for $name {
            fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> IsNull {
                <&str as Encode<Postgres>>::encode(self.as_str(), buf)
            }
        }
    };
}

text_enum! {
    /// Physical condition of a catalogued book
    BookCondition {
        New => "New",
        Good => "Good",
        Fair => "Fair",
        Poor => "Poor",
        Damaged => "Damaged",
    }
}

text_enum! {
    Gender {
        Male => "Male",
        Female => "Female",
        Other => "Other",
    }
}

text_enum! {
    /// Membership plan of a library member
    MembershipType {
        Regular => "Regular",
        Student => "Student",
        Senior => "Senior",
        Premium => "Premium",
    }
}

text_enum! {
    /// Persisted state of a loan transaction
    LoanStatus {
        Active => "Active",
        Returned => "Returned",
        Overdue => "Overdue",
        Lost => "Lost",
        Damaged => "Damaged",
    }
}

text_enum! {
    PaymentStatus {
        Paid => "Paid",
        Unpaid => "Unpaid",
    }
}

text_enum! {
    /// Presentation status of a loan, derived at read time
    DisplayStatus {
        Active => "Active",
        DueSoon => "Due Soon",
        Overdue => "Overdue",
        Returned => "Returned",
        Lost => "Lost",
        Damaged => "Damaged",
    }
}

impl Default for BookCondition {
    fn default() -> Self {
        BookCondition::New
    }
}

impl Default for MembershipType {
    fn default() -> Self {
        MembershipType::Regular
    }
}

impl From<LoanStatus> for DisplayStatus {
    fn from(status: LoanStatus) -> Self {
        match status {
            LoanStatus::Active => DisplayStatus::Active,
            LoanStatus::Returned => DisplayStatus::Returned,
            LoanStatus::Overdue => DisplayStatus::Overdue,
            LoanStatus::Lost => DisplayStatus::Lost,
            LoanStatus::Damaged => DisplayStatus::Damaged,
        }
    }
}

impl LoanStatus {
    /// Status shown to clients: active loans past due read as overdue, and
    /// active loans due within [`DUE_SOON_DAYS`] read as due soon.
    pub fn display(self, due_date: NaiveDate, today: NaiveDate) -> DisplayStatus {
        match self {
            LoanStatus::Active if due_date < today => DisplayStatus::Overdue,
            LoanStatus::Active if (due_date - today).num_days() <= DUE_SOON_DAYS => {
                DisplayStatus::DueSoon
            }
            other => other.into(),
        }
    }
}
