//! Media player notification targets ( aux entities; ).

use uuid::Uuid;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MediaPlayerGroup {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MediaPlayer {
    pub id: Uuid,
    pub group_id: Uuid,
    pub name: String,
    pub kind: String,
    pub base_url: String,
    pub enabled: bool,
}

/// Translates a canonical library path into the path the player expects
/// (e.g. a host path vs. the container/NAS path the player mounts).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PathMapping {
    pub id: Uuid,
    pub player_id: Uuid,
    pub library_path_prefix: String,
    pub player_path_prefix: String,
}

impl PathMapping {
    pub fn translate(&self, library_path: &str) -> Option<String> {
        library_path
            .strip_prefix(self.library_path_prefix.as_str())
            .map(|rest| format!("{}{}", self.player_path_prefix, rest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_matching_prefix() {
        let m = PathMapping {
            id: Uuid::new_v4(),
            player_id: Uuid::new_v4(),
            library_path_prefix: "/movies".to_string(),
            player_path_prefix: "/mnt/media/movies".to_string(),
        };
        assert_eq!(
            m.translate("/movies/Inception (2010)/Inception (2010).mkv"),
            Some("/mnt/media/movies/Inception (2010)/Inception (2010).mkv".to_string())
        );
        assert_eq!(m.translate("/tv/Show/ep.mkv"), None);
    }
}
