use std::sync::Arc;

use aws_sdk_dynamodb::Client as DynamoClient;
use aws_sdk_s3::Client as S3Client;
use corrode_atoms::artifact::Workspace;
use corrode_atoms::inference::DetectorBackend;
use corrode_atoms::store::{DynamoStore, MockStore, StoreBackend};
use corrode_atoms::CoreResult;
use tracing::{info, warn};

use crate::config::Config;

/// Backends and settings shared by every request.
pub struct AppState {
    pub config: Config,
    pub workspace: Workspace,
    pub detector: Arc<DetectorBackend>,
    pub store: StoreBackend,
}

impl AppState {
    /// Pick the detector and store once. Either falls back to its mock when
    /// the real one cannot be loaded or reached.
    pub async fn bootstrap(config: Config) -> CoreResult<Self> {
        let detector = DetectorBackend::load_or_mock(&config.model_path, config.yolo_params());
        let store = connect_store(&config).await;
        let workspace = config.workspace();
        workspace.ensure_dirs()?;

        info!(
            "🧰 AppState ready: detector={}, store={}, uploads={}, processed={}",
            detector.kind(),
            store.kind(),
            workspace.upload_dir.display(),
            workspace.processed_dir.display(),
        );

        Ok(Self {
            config,
            workspace,
            detector: Arc::new(detector),
            store,
        })
    }
}

fn mock_store(config: &Config) -> StoreBackend {
    if config.mock_samples {
        StoreBackend::Mock(MockStore::seeded())
    } else {
        StoreBackend::Mock(MockStore::new())
    }
}

async fn connect_store(config: &Config) -> StoreBackend {
    let Some(table_name) = config.table_name.as_deref() else {
        info!("TABLE_NAME not set; using in-memory store");
        return mock_store(config);
    };

    let shared = aws_config::load_from_env().await;
    let mut dynamo_config = aws_sdk_dynamodb::config::Builder::from(&shared);
    if let Some(url) = config.dynamodb_endpoint_url.as_deref() {
        dynamo_config = dynamo_config.endpoint_url(url);
    }
    let dynamo = DynamoClient::from_conf(dynamo_config.build());
    let s3 = S3Client::new(&shared);

    let store = DynamoStore::new(dynamo, s3, table_name, &config.bucket_name, config.remote_timeout);
    match store.probe().await {
        Ok(()) => {
            info!("Connected to DynamoDB table {}", store.table_name());
            StoreBackend::Remote(store)
        }
        Err(e) => {
            warn!("DynamoDB table {} unavailable ({}); using in-memory store", table_name, e);
            mock_store(config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corrode_atoms::store::Store;

    fn scratch_config() -> Config {
        let root = std::env::temp_dir().join(format!("corrode-state-{}", uuid::Uuid::new_v4()));
        Config {
            model_path: root.join("missing.onnx"),
            upload_folder: root.join("uploads"),
            processed_folder: root.join("processed"),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn without_table_or_model_everything_is_mocked() {
        let config = scratch_config();
        let state = AppState::bootstrap(config.clone()).await.unwrap();

        assert!(state.detector.is_mock());
        assert!(state.store.is_mock());
        assert!(config.upload_folder.is_dir());
        assert!(config.processed_folder.is_dir());
        assert!(state.store.get_all_images().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn mock_samples_seed_the_history() {
        let config = Config {
            mock_samples: true,
            ..scratch_config()
        };
        let state = AppState::bootstrap(config).await.unwrap();

        assert_eq!(state.store.get_all_images().await.unwrap().len(), 2);
    }
}
