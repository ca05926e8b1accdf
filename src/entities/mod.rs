pub mod prelude;

pub mod countries;
pub mod genres;
pub mod languages;
pub mod studios;
pub mod themes;

pub mod film_countries;
pub mod film_genres;
pub mod film_languages;
pub mod film_studios;
pub mod film_themes;
pub mod films;

pub mod blacklisted_tokens;
pub mod outstanding_tokens;
pub mod user_follows;
pub mod users;
