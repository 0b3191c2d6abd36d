use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::error::CredentialError;

/// Имя файла, под которым токен хранится по умолчанию.
pub const DEFAULT_TOKEN_FILE: &str = ".auth_token";

/// Хранилище единственного bearer-токена.
///
/// Срок действия не отслеживается: токен считается недействительным только
/// когда сервер отвечает 401.
pub trait CredentialStore: Send + Sync {
    /// Текущий токен, если он есть.
    fn get(&self) -> Option<String>;

    /// Сохраняет токен. Пустой токен равносилен `clear`.
    fn set(&self, token: &str) -> Result<(), CredentialError>;

    /// Удаляет токен.
    fn clear(&self) -> Result<(), CredentialError>;
}

pub(crate) fn parse_token(raw: &str) -> Option<String> {
    let token = raw.trim().to_string();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

#[derive(Debug, Default)]
/// Токен в памяти процесса.
pub struct MemoryCredentialStore {
    token: RwLock<Option<String>>,
}

impl MemoryCredentialStore {
    /// Пустое хранилище.
    pub fn new() -> Self {
        Self::default()
    }

    /// Хранилище с заранее заданным токеном.
    pub fn with_token(token: &str) -> Self {
        Self {
            token: RwLock::new(parse_token(token)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Option<String> {
        self.token.read().ok()?.clone()
    }

    fn set(&self, token: &str) -> Result<(), CredentialError> {
        let mut guard = self
            .token
            .write()
            .map_err(|_| CredentialError::Unavailable("token lock poisoned".to_string()))?;
        *guard = parse_token(token);
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialError> {
        self.set("")
    }
}

#[derive(Debug, Clone)]
/// Токен в файле, переживает перезапуск процесса.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Хранилище в указанном файле.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Путь к файлу с токеном.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Option<String> {
        let raw = fs::read_to_string(&self.path).ok()?;
        parse_token(&raw)
    }

    fn set(&self, token: &str) -> Result<(), CredentialError> {
        match parse_token(token) {
            Some(token) => fs::write(&self.path, token).map_err(CredentialError::from),
            None => self.clear(),
        }
    }

    fn clear(&self) -> Result<(), CredentialError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
