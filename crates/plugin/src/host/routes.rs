//! Route registry shared between the host and plugins

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// A registered route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Upper-cased HTTP method
    pub method: String,

    /// Route path
    pub path: String,

    /// Plugin (or host component) that registered the route
    pub owner: String,
}

/// A route that was rejected because the method and path were taken
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteCollision {
    pub method: String,
    pub path: String,
    pub existing_owner: String,
    pub rejected_owner: String,
}

/// Route table with first-writer-wins collision tracking
#[derive(Debug, Default)]
pub struct RouteRegistry {
    routes: RwLock<Vec<Route>>,
    collisions: RwLock<Vec<RouteCollision>>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route. Returns `false` and records a collision when the
    /// method and path already belong to someone.
    pub async fn add(&self, method: &str, path: &str, owner: &str) -> bool {
        let method = method.to_ascii_uppercase();
        let mut routes = self.routes.write().await;

        if let Some(existing) = routes
            .iter()
            .find(|route| route.method == method && route.path == path)
        {
            self.collisions.write().await.push(RouteCollision {
                method,
                path: path.to_string(),
                existing_owner: existing.owner.clone(),
                rejected_owner: owner.to_string(),
            });
            return false;
        }

        routes.push(Route {
            method,
            path: path.to_string(),
            owner: owner.to_string(),
        });
        true
    }

    /// All accepted routes in registration order
    pub async fn routes(&self) -> Vec<Route> {
        self.routes.read().await.clone()
    }

    /// Collisions recorded so far, without clearing them
    pub async fn collisions(&self) -> Vec<RouteCollision> {
        self.collisions.read().await.clone()
    }

    /// Collisions recorded since the last call
    pub async fn take_collisions(&self) -> Vec<RouteCollision> {
        std::mem::take(&mut *self.collisions.write().await)
    }
}
