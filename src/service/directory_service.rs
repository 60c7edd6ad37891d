//! Read paths over premises, cameras and users.

use std::sync::Arc;

use chrono::Utc;

use crate::auth::Caller;
use crate::domain::{Camera, CameraId, CameraStatus, IncidentId, Premise, PremiseId, Role, User};
use crate::error::ServiceError;
use crate::persistence::Store;

/// Role-gated lookups of the monitored estate and its staff.
#[derive(Debug, Clone)]
pub struct DirectoryService {
    store: Arc<dyn Store>,
}

impl DirectoryService {
    /// Creates the service.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Lists every premise. Operators only.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::PermissionDenied`] for guards.
    pub async fn premises(&self, caller: &Caller) -> Result<Vec<Premise>, ServiceError> {
        caller.require_operator("listing premises")?;
        self.store.list_premises().await
    }

    /// Loads one premise. Operators only.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::PermissionDenied`] for guards.
    /// - [`ServiceError::NotFound`] if the premise does not exist.
    pub async fn premise(&self, caller: &Caller, id: PremiseId) -> Result<Premise, ServiceError> {
        caller.require_operator("reading a premise")?;
        self.store
            .find_premise(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("premise", id))
    }

    /// Lists the cameras installed on a premise.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotFound`] if the premise does not exist.
    pub async fn premise_cameras(&self, id: PremiseId) -> Result<Vec<Camera>, ServiceError> {
        if self.store.find_premise(id).await?.is_none() {
            return Err(ServiceError::not_found("premise", id));
        }
        self.store.cameras_by_premise(id).await
    }

    /// Lists every camera. Operators only.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::PermissionDenied`] for guards.
    pub async fn cameras(&self, caller: &Caller) -> Result<Vec<Camera>, ServiceError> {
        caller.require_operator("listing cameras")?;
        self.store.list_cameras().await
    }

    /// Lists cameras on a premise. Operators only.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::PermissionDenied`] for guards.
    pub async fn cameras_by_premise(
        &self,
        caller: &Caller,
        id: PremiseId,
    ) -> Result<Vec<Camera>, ServiceError> {
        caller.require_operator("listing premise cameras")?;
        self.store.cameras_by_premise(id).await
    }

    /// Lists the cameras the calling guard watches.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::PermissionDenied`] for operators.
    pub async fn assigned_cameras(&self, caller: &Caller) -> Result<Vec<Camera>, ServiceError> {
        caller.require_role(Role::Guard, "listing assigned cameras")?;
        self.store.cameras_for_guard(caller.user_id).await
    }

    /// Loads one camera; guards only see cameras assigned to them.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::NotFound`] if the camera does not exist.
    /// - [`ServiceError::PermissionDenied`] if a guard does not watch it.
    pub async fn camera(&self, caller: &Caller, id: CameraId) -> Result<Camera, ServiceError> {
        let camera = self
            .store
            .find_camera(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("camera", id))?;
        if let Some(guard) = caller.scope().guard() {
            let watchers = self.store.users_by_camera(id).await?;
            if !watchers.iter().any(|u| u.id == guard) {
                return Err(ServiceError::PermissionDenied(format!(
                    "camera {id} is not assigned to you"
                )));
            }
        }
        Ok(camera)
    }

    /// Sets a camera's operational status. Operators only.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::PermissionDenied`] for guards.
    /// - [`ServiceError::NotFound`] if the camera does not exist.
    pub async fn set_camera_status(
        &self,
        caller: &Caller,
        id: CameraId,
        status: CameraStatus,
    ) -> Result<Camera, ServiceError> {
        caller.require_operator("changing camera status")?;
        if !self.store.set_camera_status(id, status, Utc::now()).await? {
            return Err(ServiceError::not_found("camera", id));
        }
        tracing::info!(camera_id = %id, %status, "camera status changed");
        self.camera(caller, id).await
    }

    /// Lists every user. Operators only.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::PermissionDenied`] for guards.
    pub async fn users(&self, caller: &Caller) -> Result<Vec<User>, ServiceError> {
        caller.require_operator("listing users")?;
        self.store.list_users().await
    }

    /// Lists the guards on an incident's roster. Operators only.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::PermissionDenied`] for guards.
    pub async fn users_by_incident(
        &self,
        caller: &Caller,
        id: IncidentId,
    ) -> Result<Vec<User>, ServiceError> {
        caller.require_operator("listing incident guards")?;
        self.store.users_by_incident(id).await
    }

    /// Lists the guards watching a camera. Operators only.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::PermissionDenied`] for guards.
    pub async fn users_by_camera(
        &self,
        caller: &Caller,
        id: CameraId,
    ) -> Result<Vec<User>, ServiceError> {
        caller.require_operator("listing camera guards")?;
        self.store.users_by_camera(id).await
    }
}
