pub use super::blacklisted_tokens::Entity as BlacklistedTokens;
pub use super::countries::Entity as Countries;
pub use super::film_countries::Entity as FilmCountries;
pub use super::film_genres::Entity as FilmGenres;
pub use super::film_languages::Entity as FilmLanguages;
pub use super::film_studios::Entity as FilmStudios;
pub use super::film_themes::Entity as FilmThemes;
pub use super::films::Entity as Films;
pub use super::genres::Entity as Genres;
pub use super::languages::Entity as Languages;
pub use super::outstanding_tokens::Entity as OutstandingTokens;
pub use super::studios::Entity as Studios;
pub use super::themes::Entity as Themes;
pub use super::user_follows::Entity as UserFollows;
pub use super::users::Entity as Users;
