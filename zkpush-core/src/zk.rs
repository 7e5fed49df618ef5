use std::time::Duration;

use tracing::debug;
use zookeeper::{Acl, CreateMode, Stat, WatchedEvent, Watcher, ZooKeeper};

use crate::namespace::{Namespace, NamespaceError, NodeStat};

pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_millis(30_000);

struct SessionWatcher;

impl Watcher for SessionWatcher {
    fn handle(&self, event: WatchedEvent) {
        debug!(
            state = ?event.keeper_state,
            kind = ?event.event_type,
            path = ?event.path,
            "zookeeper session event"
        );
    }
}

/// [`Namespace`] backed by a live ZooKeeper session.
pub struct ZkNamespace {
    zk: ZooKeeper,
}

impl ZkNamespace {
    pub fn connect(
        connection_string: &str,
        session_timeout: Duration,
    ) -> Result<Self, NamespaceError> {
        debug!(connection_string, ?session_timeout, "opening zookeeper session");
        let zk = ZooKeeper::connect(connection_string, session_timeout, SessionWatcher).map_err(
            |source| NamespaceError::Connect {
                connection_string: connection_string.to_string(),
                source,
            },
        )?;
        Ok(Self { zk })
    }
}

impl Namespace for ZkNamespace {
    fn stat(&self, path: &str) -> Result<Option<NodeStat>, NamespaceError> {
        self.zk
            .exists(path, false)
            .map(|stat| stat.as_ref().map(node_stat))
            .map_err(|err| NamespaceError::from_zk(path, err))
    }

    fn create(&self, path: &str) -> Result<(), NamespaceError> {
        self.zk
            .create(
                path,
                Vec::new(),
                Acl::open_unsafe().clone(),
                CreateMode::Persistent,
            )
            .map(|_| ())
            .map_err(|err| NamespaceError::from_zk(path, err))
    }

    fn set_data(
        &self,
        path: &str,
        data: &[u8],
        version: Option<i32>,
    ) -> Result<NodeStat, NamespaceError> {
        self.zk
            .set_data(path, data.to_vec(), version)
            .map(|stat| node_stat(&stat))
            .map_err(|err| NamespaceError::from_zk(path, err))
    }

    fn get_data(&self, path: &str) -> Result<Option<Vec<u8>>, NamespaceError> {
        match self.zk.get_data(path, false) {
            Ok((data, _)) => Ok(Some(data)),
            Err(zookeeper::ZkError::NoNode) => Ok(None),
            Err(err) => Err(NamespaceError::from_zk(path, err)),
        }
    }

    fn children(&self, path: &str) -> Result<Vec<String>, NamespaceError> {
        self.zk
            .get_children(path, false)
            .map_err(|err| NamespaceError::from_zk(path, err))
    }

    fn delete(&self, path: &str, version: Option<i32>) -> Result<(), NamespaceError> {
        self.zk
            .delete(path, version)
            .map_err(|err| NamespaceError::from_zk(path, err))
    }

    fn close(&self) -> Result<(), NamespaceError> {
        debug!("closing zookeeper session");
        self.zk
            .close()
            .map_err(|err| NamespaceError::from_zk("/", err))
    }
}

fn node_stat(stat: &Stat) -> NodeStat {
    NodeStat {
        version: stat.version,
        data_length: stat.data_length,
        num_children: stat.num_children,
    }
}
