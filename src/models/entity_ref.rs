//! Polymorphic entity reference, replacing the (entity_type, entity_id) string
//! pair with a checked sum type.

use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum EntityRef {
    Movie(Uuid),
    Series(Uuid),
    Season(Uuid),
    Episode(Uuid),
    Artist(Uuid),
    Album(Uuid),
    Track(Uuid),
}

impl EntityRef {
    pub fn entity_type(&self) -> &'static str {
        match self {
            EntityRef::Movie(_) => "movie",
            EntityRef::Series(_) => "series",
            EntityRef::Season(_) => "season",
            EntityRef::Episode(_) => "episode",
            EntityRef::Artist(_) => "artist",
            EntityRef::Album(_) => "album",
            EntityRef::Track(_) => "track",
        }
    }

    pub fn entity_id(&self) -> Uuid {
        match self {
            EntityRef::Movie(id)
            | EntityRef::Series(id)
            | EntityRef::Season(id)
            | EntityRef::Episode(id)
            | EntityRef::Artist(id)
            | EntityRef::Album(id)
            | EntityRef::Track(id) => *id,
        }
    }

    pub fn from_parts(entity_type: &str, entity_id: Uuid) -> Option<Self> {
        Some(match entity_type {
            "movie" => EntityRef::Movie(entity_id),
            "series" => EntityRef::Series(entity_id),
            "season" => EntityRef::Season(entity_id),
            "episode" => EntityRef::Episode(entity_id),
            "artist" => EntityRef::Artist(entity_id),
            "album" => EntityRef::Album(entity_id),
            "track" => EntityRef::Track(entity_id),
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_parts() {
        let id = Uuid::new_v4();
        let r = EntityRef::Movie(id);
        assert_eq!(EntityRef::from_parts(r.entity_type(), r.entity_id()), Some(r));
    }

    #[test]
    fn rejects_unknown_type() {
        assert_eq!(EntityRef::from_parts("playlist", Uuid::new_v4()), None);
    }
}
