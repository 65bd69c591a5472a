use std::fs;
use std::io;
use std::path::Path;

use bookhub_client::Session;

pub const SESSION_FILE: &str = ".bookhub_session";

fn parse_session_content(raw: &str) -> Result<Option<Session>, serde_json::Error> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(raw).map(Some)
}

/// Читает сохранённую сессию; отсутствующий или пустой файл означает, что
/// вход не выполнен.
pub fn load(path: &Path) -> io::Result<Option<Session>> {
    if !path.exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(path)?;
    parse_session_content(&raw).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}

pub fn save(path: &Path, session: &Session) -> io::Result<()> {
    let raw = serde_json::to_string_pretty(session)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
    fs::write(path, raw)
}

pub fn remove(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use bookhub_client::SessionUser;

    use super::*;

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("bookhub-session-{}.json", uuid::Uuid::new_v4()))
    }

    fn session() -> Session {
        Session {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: None,
            user: SessionUser {
                id: "user-1".to_string(),
                email: Some("reader@example.com".to_string()),
                user_metadata: Default::default(),
            },
        }
    }

    #[test]
    fn parse_session_content_rejects_blank() {
        let parsed = parse_session_content("  \n").expect("blank is not an error");
        assert!(parsed.is_none());
    }

    #[test]
    fn parse_session_content_reports_garbage() {
        assert!(parse_session_content("not json").is_err());
    }

    #[test]
    fn save_load_and_remove() {
        let path = temp_path();
        assert!(load(&path).expect("missing file is fine").is_none());

        save(&path, &session()).expect("save must succeed");
        let loaded = load(&path).expect("load must succeed");
        assert_eq!(loaded, Some(session()));

        remove(&path).expect("remove must succeed");
        remove(&path).expect("second remove is a no-op");
        assert!(!path.exists());
    }
}
