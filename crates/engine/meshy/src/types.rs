//! Wire types for the text-to-3D API

use serde::{Deserialize, Serialize};

/// Lifecycle of a generation task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Pending,
    #[serde(alias = "IN_PROGRESS")]
    Processing,
    Succeeded,
    Failed,
}

/// Body of `POST /text-to-3d`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextTo3dRequest {
    pub mode: String,
    pub prompt: String,
    pub negative_prompt: String,
    pub art_style: String,
    pub should_remesh: bool,
}

/// Response of `POST /text-to-3d`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTaskResponse {
    /// Task identifier
    pub result: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ModelUrls {
    #[serde(default)]
    pub glb: Option<String>,
    #[serde(default)]
    pub obj: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TaskErrorDetail {
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of `GET /text-to-3d/{id}`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TaskSnapshot {
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub model_urls: Option<ModelUrls>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub task_error: Option<TaskErrorDetail>,
}

impl TaskSnapshot {
    /// The finished model, once the task succeeded with both URLs present
    pub fn generated_model(&self) -> Option<GeneratedModel> {
        if self.status != TaskStatus::Succeeded {
            return None;
        }
        let urls = self.model_urls.as_ref()?;
        let glb_url = urls.glb.as_deref().filter(|u| !u.is_empty())?;
        let obj_url = urls.obj.as_deref().filter(|u| !u.is_empty())?;

        Some(GeneratedModel {
            glb_url: glb_url.to_string(),
            obj_url: obj_url.to_string(),
        })
    }

    /// Failure reason reported by the service, if any
    ///
    /// A blank `error` falls through to `task_error.message`.
    pub fn failure_message(&self) -> Option<&str> {
        self.error
            .as_deref()
            .filter(non_blank)
            .or_else(|| self.task_error.as_ref()?.message.as_deref().filter(non_blank))
    }
}

fn non_blank(message: &&str) -> bool {
    !message.trim().is_empty()
}

/// Output format of a generated mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshFormat {
    /// Binary glTF scene, used for preview
    Glb,
    /// Plain Wavefront mesh, used for printing
    Obj,
}

impl MeshFormat {
    pub fn extension(self) -> &'static str {
        match self {
            MeshFormat::Glb => "glb",
            MeshFormat::Obj => "obj",
        }
    }
}

/// Fetch URLs of a successfully generated mesh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedModel {
    pub glb_url: String,
    pub obj_url: String,
}

impl GeneratedModel {
    pub fn url(&self, format: MeshFormat) -> &str {
        match format {
            MeshFormat::Glb => &self.glb_url,
            MeshFormat::Obj => &self.obj_url,
        }
    }

    /// Every format with its URL
    pub fn formats(&self) -> [(MeshFormat, &str); 2] {
        [
            (MeshFormat::Glb, self.glb_url.as_str()),
            (MeshFormat::Obj, self.obj_url.as_str()),
        ]
    }
}
