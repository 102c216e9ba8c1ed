//! User generation with demographics.

use batch_seed::{RecordId, SeedRecord};
use batch_seed::record::record_id;
use fake::{Fake, faker::name::en::Name};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

/// Generated user account ready for seeding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedUser {
    pub id: RecordId,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub roles: Vec<String>,
    pub birth_year: Option<i32>,
    pub country: Option<String>,
    pub registered_at: OffsetDateTime,
}

impl SeedRecord for GeneratedUser {
    const KIND: &'static str = "user";

    fn id(&self) -> RecordId {
        self.id
    }

    fn validate(&self) -> Result<(), String> {
        if self.username.is_empty() {
            return Err("username is empty".to_string());
        }
        if !self.email.contains('@') {
            return Err(format!("invalid email {:?}", self.email));
        }
        Ok(())
    }
}

/// Configuration for user generation.
#[derive(Debug, Clone)]
pub struct UserGenConfig {
    /// Probability that a user is an administrator.
    pub admin_ratio: f64,
    /// Mean birth year.
    pub birth_year_mean: i32,
    /// Standard deviation of birth year.
    pub birth_year_std: f64,
    /// Probability that demographics are filled in.
    pub demographics_fill_rate: f64,
    /// Countries a user may come from.
    pub countries: Vec<String>,
    /// Registrations are spread over this many days before the base time.
    pub registration_window_days: i64,
}

impl Default for UserGenConfig {
    fn default() -> Self {
        Self {
            admin_ratio: 0.02,
            birth_year_mean: 1988,
            birth_year_std: 11.0,
            demographics_fill_rate: 0.6,
            countries: vec![
                "US".to_string(),
                "FR".to_string(),
                "DE".to_string(),
                "GB".to_string(),
            ],
            registration_window_days: 730,
        }
    }
}

/// Generates realistic user data for testing.
pub struct UserGenerator {
    config: UserGenConfig,
}

impl UserGenerator {
    /// Creates a new user generator with default configuration.
    pub fn new() -> Self {
        Self {
            config: UserGenConfig::default(),
        }
    }

    /// Creates a generator with custom configuration.
    pub fn with_config(config: UserGenConfig) -> Self {
        Self { config }
    }

    /// Generates the user with 1-based `index`.
    ///
    /// The index is folded into username and email so both stay unique
    /// however many users are generated.
    pub fn generate(
        &self,
        index: u64,
        base_time: OffsetDateTime,
        rng: &mut impl Rng,
    ) -> anyhow::Result<GeneratedUser> {
        let id = record_id(rng);
        let full_name: String = Name().fake_with_rng(rng);
        let handle = normalize(&full_name);
        let username = format!("{handle}{index}");
        let email = self.generate_email(&handle, index, rng);

        let roles = if rng.r#gen::<f64>() < self.config.admin_ratio {
            vec!["ROLE_USER".to_string(), "ROLE_ADMIN".to_string()]
        } else {
            vec!["ROLE_USER".to_string()]
        };

        let (birth_year, country) = if rng.r#gen::<f64>() < self.config.demographics_fill_rate {
            (
                Some(self.generate_birth_year(rng)?),
                self.config
                    .countries
                    .get(rng.gen_range(0..self.config.countries.len().max(1)))
                    .cloned(),
            )
        } else {
            (None, None)
        };

        let window = self.config.registration_window_days.max(1);
        let registered_at = base_time
            - Duration::days(rng.gen_range(0..window))
            - Duration::minutes(rng.gen_range(0..1440));

        Ok(GeneratedUser {
            id,
            username,
            email,
            full_name,
            roles,
            birth_year,
            country,
            registered_at,
        })
    }

    /// Generates an email from a normalized name.
    fn generate_email(&self, handle: &str, index: u64, rng: &mut impl Rng) -> String {
        let domains = ["example.com", "example.org", "example.net", "mail.test"];
        let domain = domains[rng.gen_range(0..domains.len())];

        format!("{handle}.{index}@{domain}")
    }

    /// Generates a birth year based on configured distribution.
    fn generate_birth_year(&self, rng: &mut impl Rng) -> anyhow::Result<i32> {
        let normal = Normal::new(
            self.config.birth_year_mean as f64,
            self.config.birth_year_std,
        )?;

        let year = normal.sample(rng) as i32;
        // Clamp to adult users
        Ok(year.clamp(1940, 2007))
    }
}

impl Default for UserGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Lowercases a name and joins its words with dots.
fn normalize(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ')
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_generate_user() {
        let user_gen = UserGenerator::new();
        let mut rng = StdRng::seed_from_u64(12345);
        let now = OffsetDateTime::now_utc();
        let user = user_gen.generate(1, now, &mut rng).unwrap();

        assert!(!user.full_name.is_empty());
        assert!(user.email.contains('@'));
        assert!(user.username.ends_with('1'));
        assert!(user.roles.contains(&"ROLE_USER".to_string()));
        assert!(user.registered_at <= now);
        assert!(user.validate().is_ok());
    }

    #[test]
    fn test_emails_are_unique() {
        let user_gen = UserGenerator::new();
        let mut rng = StdRng::seed_from_u64(12345);
        let now = OffsetDateTime::now_utc();

        let emails: std::collections::HashSet<_> = (1..=200)
            .map(|i| user_gen.generate(i, now, &mut rng).unwrap().email)
            .collect();
        assert_eq!(emails.len(), 200);
    }

    #[test]
    fn test_same_seed_same_user() {
        let user_gen = UserGenerator::new();
        let now = OffsetDateTime::now_utc();

        let a = user_gen
            .generate(5, now, &mut StdRng::seed_from_u64(9))
            .unwrap();
        let b = user_gen
            .generate(5, now, &mut StdRng::seed_from_u64(9))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_admin_ratio() {
        let user_gen = UserGenerator::with_config(UserGenConfig {
            admin_ratio: 1.0,
            ..Default::default()
        });
        let mut rng = StdRng::seed_from_u64(1);
        let user = user_gen
            .generate(1, OffsetDateTime::now_utc(), &mut rng)
            .unwrap();

        assert!(user.roles.contains(&"ROLE_ADMIN".to_string()));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("Ada Lovelace"), "ada.lovelace");
        assert_eq!(normalize("Mary-Jane O'Neil"), "maryjane.oneil");
    }
}
