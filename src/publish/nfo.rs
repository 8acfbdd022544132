//! NFO regeneration: renders a Kodi-style XML document from a
//! movie row. Field locks gate which inputs feed regeneration elsewhere
//! (the caller only passes fields that are safe to publish); this module is
//! pure string rendering.

use crate::models::Movie;

pub fn render_nfo(movie: &Movie, genres: &[String], studios: &[String]) -> String {
    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n");
    xml.push_str("<movie>\n");
    write_tag(&mut xml, "title", &movie.title);
    if let Some(v) = &movie.original_title {
        write_tag(&mut xml, "originaltitle", v);
    }
    if let Some(v) = &movie.sort_title {
        write_tag(&mut xml, "sorttitle", v);
    }
    if let Some(v) = &movie.plot {
        write_tag(&mut xml, "plot", v);
    }
    if let Some(v) = &movie.outline {
        write_tag(&mut xml, "outline", v);
    }
    if let Some(v) = &movie.tagline {
        write_tag(&mut xml, "tagline", v);
    }
    if let Some(v) = movie.runtime_minutes {
        write_tag(&mut xml, "runtime", &v.to_string());
    }
    if let Some(v) = movie.year {
        write_tag(&mut xml, "year", &v.to_string());
    }
    if let Some(v) = &movie.content_rating {
        write_tag(&mut xml, "mpaa", v);
    }
    if let Some(v) = movie.tmdb_id {
        xml.push_str(&format!("  <uniqueid type=\"tmdb\" default=\"true\">{v}</uniqueid>\n"));
    }
    if let Some(v) = &movie.imdb_id {
        xml.push_str(&format!("  <uniqueid type=\"imdb\">{}</uniqueid>\n", escape(v)));
    }
    for genre in genres {
        write_tag(&mut xml, "genre", genre);
    }
    for studio in studios {
        write_tag(&mut xml, "studio", studio);
    }
    xml.push_str("</movie>\n");
    xml
}

fn write_tag(xml: &mut String, name: &str, value: &str) {
    xml.push_str(&format!("  <{name}>{}</{name}>\n", escape(value)));
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::locks::FieldLocks;
    use crate::models::IdentificationStatus;
    use uuid::Uuid;

    fn movie() -> Movie {
        Movie {
            id: Uuid::new_v4(),
            library_id: Uuid::new_v4(),
            file_path: "x".into(),
            file_name: "Inception (2010).mkv".into(),
            file_size: 1,
            file_hash: None,
            tmdb_id: Some(27205),
            imdb_id: Some("tt1375666".into()),
            title: "Inception".into(),
            original_title: None,
            sort_title: None,
            tagline: None,
            plot: Some("A thief who steals corporate secrets.".into()),
            outline: None,
            runtime_minutes: Some(148),
            year: Some(2010),
            release_date: None,
            content_rating: None,
            provider_rating: None,
            user_rating: None,
            monitored: true,
            identification_status: IdentificationStatus::Enriched,
            enrichment_priority: 5,
            enriched_at: None,
            published_at: None,
            deleted_at: None,
            locks: FieldLocks::default(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn renders_tmdb_uniqueid_and_title() {
        let xml = render_nfo(&movie(), &["Sci-Fi".to_string()], &[]);
        assert!(xml.contains("<title>Inception</title>"));
        assert!(xml.contains("type=\"tmdb\""));
        assert!(xml.contains("27205"));
        assert!(xml.contains("<genre>Sci-Fi</genre>"));
    }

    #[test]
    fn escapes_xml_special_characters_in_plot() {
        let mut m = movie();
        m.plot = Some("Cats & Dogs <fight>".to_string());
        let xml = render_nfo(&m, &[], &[]);
        assert!(xml.contains("Cats &amp; Dogs &lt;fight&gt;"));
    }
}
