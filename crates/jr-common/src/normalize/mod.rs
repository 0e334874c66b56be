pub mod country;
pub mod date_posted;
pub mod job_type;
pub mod location;
pub mod salary;

// Keep re-exports unique so downstream crates see a single symbol per helper.
pub use country::{alias_bucket, country_code};
pub use date_posted::{parse_posted_date, DateWindow};
pub use job_type::{correct_job_type, normalize_job_type};
pub use location::{recover_state_code, split_location, ParsedLocation};
pub use salary::parse_salary_range;
