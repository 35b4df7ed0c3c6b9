//! FTP/FTPS implementation of [`RemoteStore`]

use crate::error::{Error, Result};
use crate::store::RemoteStore;
use std::io::Cursor;
use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;
use suppaftp::native_tls::TlsConnector;
use suppaftp::types::FileType;
use suppaftp::{FtpError, Mode, NativeTlsConnector, NativeTlsFtpStream};
use tracing::{info, warn};

pub const DEFAULT_PORT: u16 = 21;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Connection parameters
#[derive(Debug, Clone)]
pub struct FtpSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Try explicit FTPS before plain FTP
    pub secure: bool,
    pub timeout: Duration,
}

/// An open FTP control connection
pub struct FtpStore {
    stream: NativeTlsFtpStream,
    host: String,
}

impl FtpStore {
    /// Connect and log in.
    ///
    /// With `secure` set, a TLS session (AUTH TLS, PROT P) is attempted
    /// first; if any step of it fails a new plain connection is opened.
    pub fn connect(settings: &FtpSettings) -> Result<Self> {
        if settings.secure {
            match Self::connect_secure(settings) {
                Ok(stream) => {
                    info!(host = %settings.host, port = settings.port, "connected via FTPS");
                    return Ok(Self::ready(stream, settings));
                }
                Err(e) => {
                    warn!(host = %settings.host, error = %e, "FTPS failed, falling back to plain FTP");
                }
            }
        }

        let mut stream = open(settings).map_err(|e| Error::remote("connect", &settings.host, e))?;
        stream
            .login(&settings.user, &settings.password)
            .map_err(|e| Error::remote("login", &settings.host, e))?;
        info!(host = %settings.host, port = settings.port, "connected via FTP");
        Ok(Self::ready(stream, settings))
    }

    fn connect_secure(settings: &FtpSettings) -> std::result::Result<NativeTlsFtpStream, FtpError> {
        let connector = TlsConnector::new().map_err(|e| FtpError::SecureError(e.to_string()))?;
        let mut stream =
            open(settings)?.into_secure(NativeTlsConnector::from(connector), &settings.host)?;
        stream.login(&settings.user, &settings.password)?;
        Ok(stream)
    }

    fn ready(mut stream: NativeTlsFtpStream, settings: &FtpSettings) -> Self {
        stream.set_mode(Mode::Passive);
        Self {
            stream,
            host: settings.host.clone(),
        }
    }

    fn remote_err(&self, operation: &'static str, path: &str) -> impl FnOnce(FtpError) -> Error {
        let path = format!("{}:{}", self.host, path);
        move |e| Error::remote(operation, path, e)
    }
}

fn open(settings: &FtpSettings) -> std::result::Result<NativeTlsFtpStream, FtpError> {
    let addr: SocketAddr = (settings.host.as_str(), settings.port)
        .to_socket_addrs()
        .map_err(FtpError::ConnectionError)?
        .next()
        .ok_or_else(|| {
            FtpError::ConnectionError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no address for {}", settings.host),
            ))
        })?;

    let stream = NativeTlsFtpStream::connect_timeout(addr, settings.timeout)?;
    stream
        .get_ref()
        .set_read_timeout(Some(settings.timeout))
        .map_err(FtpError::ConnectionError)?;
    Ok(stream)
}

impl RemoteStore for FtpStore {
    fn change_dir(&mut self, dir: &str) -> Result<()> {
        let err = self.remote_err("cwd", dir);
        self.stream.cwd(dir).map_err(err)
    }

    fn make_dir(&mut self, dir: &str) -> Result<()> {
        let err = self.remote_err("mkdir", dir);
        self.stream.mkdir(dir).map_err(err)
    }

    fn retrieve(&mut self, filename: &str) -> Result<Vec<u8>> {
        let err = self.remote_err("download", filename);
        self.stream
            .transfer_type(FileType::Binary)
            .and_then(|_| self.stream.retr_as_buffer(filename))
            .map(Cursor::into_inner)
            .map_err(err)
    }

    fn store(&mut self, filename: &str, data: &[u8]) -> Result<()> {
        let err = self.remote_err("upload", filename);
        self.stream
            .transfer_type(FileType::Binary)
            .and_then(|_| self.stream.put_file(filename, &mut Cursor::new(data)))
            .map(|_| ())
            .map_err(err)
    }

    fn close(&mut self) -> Result<()> {
        let err = self.remote_err("quit", "/");
        self.stream.quit().map_err(err)
    }
}
