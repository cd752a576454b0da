pub mod anilist;
pub mod nyaa;
pub mod sneedex;
