//! storage-navigator: browse a storage backend from the terminal.
//!
//! Listings go to stdout, logs to stderr (`RUST_LOG`, default `info`).

mod render;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use storage_navigator_core::backends::{
    ArchiveAdapter, ArchiveFormat, LocalAdapter, NullAdapter,
};
use storage_navigator_core::files::utils::format_size;
use storage_navigator_core::navigation::FormActionSource;
use storage_navigator_core::{
    BrowserConfig, Download, NavigatorResponse, RequestContext, StorageAdapter, StorageNavigator,
};
use tokio::io::AsyncWriteExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

use render::{ConsoleRenderer, JsonRenderer};

#[derive(Parser)]
#[command(name = "storage-navigator", version, about = "Browse local, remote, object and archive storage")]
struct Cli {
    /// Browser configuration file (JSON with date_format, ignore_filenames, ignore_extensions)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Root location navigation is confined to
    #[arg(long, global = true, default_value = "")]
    root: String,
    /// List this location instead of the root
    #[arg(long, global = true, conflicts_with = "download")]
    cd: Option<String>,
    /// Download this file
    #[arg(long, global = true)]
    download: Option<String>,
    /// Where to save a download (defaults to its name in the current directory)
    #[arg(long, short, global = true)]
    output: Option<PathBuf>,
    /// Print listings as JSON
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    backend: Backend,
}

#[derive(Subcommand)]
enum Backend {
    /// A directory on the local disk
    Local {
        /// Base directory
        path: PathBuf,
    },
    /// A ZIP, TAR or TAR.GZ archive
    Archive {
        /// Archive file
        path: PathBuf,
        /// Format, when it cannot be told from the extension: zip, tar, tar.gz
        #[arg(long)]
        format: Option<String>,
        /// Unpack everything into this directory and exit
        #[arg(long)]
        extract: Option<PathBuf>,
    },
    /// An FTP server
    #[cfg(feature = "ftp")]
    Ftp {
        host: String,
        #[arg(long, default_value = "21")]
        port: u16,
        #[arg(long, short)]
        username: String,
        /// Password; `${env:NAME}` placeholders are expanded
        #[arg(long, default_value = "")]
        password: String,
        /// Use active instead of passive mode
        #[arg(long)]
        active: bool,
        #[arg(long, default_value = "/")]
        root_dir: String,
    },
    /// An SFTP server
    #[cfg(feature = "sftp")]
    Sftp {
        host: String,
        #[arg(long, default_value = "22")]
        port: u16,
        #[arg(long, short)]
        username: String,
        /// Password, or key passphrase with --key
        #[arg(long)]
        password: Option<String>,
        /// Private key file
        #[arg(long)]
        key: Option<String>,
        /// Authenticate through the SSH agent
        #[arg(long, conflicts_with = "key")]
        agent: bool,
        #[arg(long, default_value = "/")]
        root_dir: String,
    },
    /// An S3 bucket or S3-compatible service
    #[cfg(feature = "s3")]
    S3 {
        bucket: String,
        #[arg(long)]
        region: Option<String>,
        /// Custom endpoint (MinIO etc.)
        #[arg(long)]
        endpoint: Option<String>,
    },
    /// An empty backend, for trying out configuration
    Null,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so they don't mix with the listing on stdout
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => BrowserConfig::default(),
    };

    if let Backend::Archive {
        path,
        format,
        extract: Some(destination),
    } = &cli.backend
    {
        let archive = open_archive(path, format.as_deref()).await?;
        archive
            .extract_all(destination)
            .await
            .with_context(|| format!("Failed to extract {}", path.display()))?;
        println!("Extracted {} to {}", path.display(), destination.display());
        return Ok(());
    }

    let adapter = build_adapter(&cli.backend).await?;
    let renderer: Box<dyn storage_navigator_core::Renderer> = if cli.json {
        Box::new(JsonRenderer::new(FormActionSource))
    } else {
        Box::new(ConsoleRenderer::stdout().with_action_source(FormActionSource))
    };
    let navigator = StorageNavigator::new(adapter, renderer, cli.root.clone(), config).await?;

    match navigator.handle(&request_context(&cli)).await? {
        NavigatorResponse::Rendered { location, entries } => {
            info!(location = %location, entries, "Listing rendered");
        }
        NavigatorResponse::Download(download) => {
            let target = save_download(download, cli.output.as_deref()).await?;
            println!("Saved {}", target.display());
        }
    }
    Ok(())
}

/// Translate the action flags into the form a browser would submit.
fn request_context(cli: &Cli) -> RequestContext {
    if let Some(path) = &cli.cd {
        RequestContext::post([("action", "changePath"), ("path", path.as_str())])
    } else if let Some(file) = &cli.download {
        RequestContext::post([("action", "downloadFile"), ("file", file.as_str())])
    } else {
        RequestContext::get()
    }
}

fn load_config(path: &Path) -> anyhow::Result<BrowserConfig> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    Ok(BrowserConfig::from_json(&json)?)
}

async fn open_archive(path: &Path, format: Option<&str>) -> anyhow::Result<ArchiveAdapter> {
    let adapter = match format {
        Some(format) => ArchiveAdapter::open_as(path, format.parse::<ArchiveFormat>()?).await?,
        None => ArchiveAdapter::open(path).await?,
    };
    Ok(adapter)
}

async fn build_adapter(backend: &Backend) -> anyhow::Result<Box<dyn StorageAdapter>> {
    let adapter: Box<dyn StorageAdapter> = match backend {
        Backend::Local { path } => Box::new(LocalAdapter::new(path)?),
        Backend::Archive { path, format, .. } => {
            Box::new(open_archive(path, format.as_deref()).await?)
        }
        #[cfg(feature = "ftp")]
        Backend::Ftp {
            host,
            port,
            username,
            password,
            active,
            root_dir,
        } => {
            use storage_navigator_core::backends::FtpAdapter;
            use storage_navigator_core::config::FtpConfig;

            let config = FtpConfig {
                host: host.clone(),
                port: *port,
                username: username.clone(),
                password: password.clone(),
                passive: !active,
                root_dir: root_dir.clone(),
            }
            .expand();
            Box::new(FtpAdapter::connect(&config).await?)
        }
        #[cfg(feature = "sftp")]
        Backend::Sftp {
            host,
            port,
            username,
            password,
            key,
            agent,
            root_dir,
        } => {
            use storage_navigator_core::backends::SftpAdapter;
            use storage_navigator_core::config::SftpConfig;

            let auth_method = if *agent {
                "agent"
            } else if key.is_some() {
                "key"
            } else {
                "password"
            };
            let config = SftpConfig {
                host: host.clone(),
                port: *port,
                username: username.clone(),
                auth_method: auth_method.to_string(),
                password: password.clone(),
                key_path: key.clone(),
                root_dir: root_dir.clone(),
            }
            .expand();
            Box::new(SftpAdapter::connect(&config).await?)
        }
        #[cfg(feature = "s3")]
        Backend::S3 {
            bucket,
            region,
            endpoint,
        } => {
            use storage_navigator_core::backends::ObjectStorageAdapter;
            use storage_navigator_core::config::S3Config;

            let config = S3Config {
                bucket: bucket.clone(),
                region: region.clone(),
                endpoint_url: endpoint.clone(),
                ..S3Config::default()
            }
            .expand();
            Box::new(ObjectStorageAdapter::s3(&config)?)
        }
        Backend::Null => Box::new(NullAdapter::new()),
    };
    Ok(adapter)
}

/// Write a download to `output`, or to its own name in the current
/// directory. An existing directory as `output` receives the file.
async fn save_download(download: Download, output: Option<&Path>) -> anyhow::Result<PathBuf> {
    let target = match output {
        Some(path) if path.is_dir() => path.join(&download.name),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(&download.name),
    };
    let mut file = tokio::fs::File::create(&target)
        .await
        .with_context(|| format!("Failed to create {}", target.display()))?;

    let mut stream = download.stream;
    let mut written: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    info!(
        path = %target.display(),
        bytes = written,
        size = %format_size(written),
        "Download saved"
    );
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage_navigator_core::navigation::{ActionSource, NavigationRequest};

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("storage-navigator").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn action_flags_become_form_requests() {
        let source = FormActionSource;

        let cli = parse(&["--cd", "docs", "local", "/tmp"]);
        assert_eq!(
            source.classify(&request_context(&cli)),
            NavigationRequest::ChangePath("docs".into())
        );

        let cli = parse(&["null", "--download", "a.txt"]);
        assert_eq!(
            source.classify(&request_context(&cli)),
            NavigationRequest::DownloadFile("a.txt".into())
        );

        let cli = parse(&["null"]);
        assert_eq!(source.classify(&request_context(&cli)), NavigationRequest::None);
    }

    #[test]
    fn cd_and_download_conflict() {
        let result = Cli::try_parse_from([
            "storage-navigator",
            "--cd",
            "a",
            "--download",
            "b",
            "null",
        ]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn download_is_written_to_directory() {
        let dir = tempfile::tempdir().unwrap();
        let download = Download::from_bytes("notes.txt", "hello");
        let target = save_download(download, Some(dir.path())).await.unwrap();
        assert_eq!(target, dir.path().join("notes.txt"));
        assert_eq!(std::fs::read_to_string(target).unwrap(), "hello");
    }

    #[test]
    fn config_file_is_validated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"colour": "blue"}"#).unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("colour"));
    }
}
