//! Letter create/send workflows
//!
//! Creating a letter takes four sequential calls: token (when needed), upload
//! slot, file upload and the create request itself. Sending takes a token and
//! one PATCH. All local input is validated before the first call, and a dry
//! run stops after validation with a preview of the request.

use crate::clients::{upload_timeout, ApiResponse, PingenApi, UploadSlot};
use crate::config::Settings;
use crate::constants::FALLBACK_FILE_NAME;
use crate::error::{PingenError, Result};
use crate::token::{Persistence, TokenManager};
use crate::types::{parse_optional, AddressPosition, DeliveryProduct, PrintMode, PrintSpectrum};
use serde_json::{json, Map, Value};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Raw `letters create` input as given on the command line
#[derive(Debug, Clone, Default)]
pub struct CreateLetterRequest {
    pub file: PathBuf,
    pub file_name: Option<String>,
    pub address_position: String,
    pub auto_send: bool,
    pub delivery_product: Option<String>,
    pub print_mode: Option<String>,
    pub print_spectrum: Option<String>,
    /// Inline JSON object, or `@path` to read it from a file
    pub meta_json: Option<String>,
    pub meta_file: Option<PathBuf>,
    pub idempotency_key: Option<String>,
}

/// Raw `letters send` input as given on the command line
#[derive(Debug, Clone, Default)]
pub struct SendLetterRequest {
    pub letter_id: String,
    pub delivery_product: Option<String>,
    pub print_mode: Option<String>,
    pub print_spectrum: Option<String>,
    pub meta_json: Option<String>,
    pub meta_file: Option<PathBuf>,
    pub idempotency_key: Option<String>,
}

/// Validated letter creation, ready to be previewed or executed
#[derive(Debug, Clone, PartialEq)]
pub struct CreateLetterPlan {
    pub file: PathBuf,
    pub file_name: String,
    pub address_position: AddressPosition,
    pub auto_send: bool,
    pub delivery_product: Option<DeliveryProduct>,
    pub print_mode: Option<PrintMode>,
    pub print_spectrum: Option<PrintSpectrum>,
    pub meta_data: Option<Map<String, Value>>,
    pub idempotency_key: Option<String>,
}

impl CreateLetterPlan {
    pub fn from_request(request: &CreateLetterRequest) -> Result<Self> {
        if request.file.as_os_str().is_empty() {
            return Err(PingenError::validation("--file is required"));
        }
        let address_position: AddressPosition = request
            .address_position
            .parse()
            .map_err(|_| PingenError::validation("address-position must be left or right"))?;
        ensure_readable_file(&request.file)?;

        let delivery_product: Option<DeliveryProduct> =
            parse_optional(request.delivery_product.as_deref())?;
        let print_mode: Option<PrintMode> = parse_optional(request.print_mode.as_deref())?;
        let print_spectrum: Option<PrintSpectrum> =
            parse_optional(request.print_spectrum.as_deref())?;

        let file_name = match request.file_name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => default_file_name(&request.file),
        };
        let meta_data = load_meta_data(request.meta_json.as_deref(), request.meta_file.as_deref())?;

        Ok(Self {
            file: request.file.clone(),
            file_name,
            address_position,
            auto_send: request.auto_send,
            delivery_product,
            print_mode,
            print_spectrum,
            meta_data,
            idempotency_key: request.idempotency_key.clone().filter(|key| !key.is_empty()),
        })
    }

    /// Letter attributes known before the upload
    pub fn attributes(&self) -> Map<String, Value> {
        let mut attributes = Map::new();
        attributes.insert("file_original_name".into(), json!(self.file_name));
        attributes.insert("address_position".into(), json!(self.address_position.as_str()));
        attributes.insert("auto_send".into(), json!(self.auto_send));
        insert_print_options(
            &mut attributes,
            self.delivery_product,
            self.print_mode,
            self.print_spectrum,
            self.meta_data.as_ref(),
        );
        attributes
    }

    pub fn preview(&self, organisation_id: &str) -> Value {
        json!({
            "action": "letters.create",
            "file": self.file.display().to_string(),
            "organisation_id": organisation_id,
            "attributes": self.attributes(),
        })
    }

    /// JSON:API body for `POST /organisations/{org}/letters`
    pub fn request_body(&self, slot: &UploadSlot) -> Value {
        let mut attributes = self.attributes();
        attributes.insert("file_url".into(), json!(slot.url));
        attributes.insert("file_url_signature".into(), json!(slot.signature));
        json!({
            "data": {
                "type": "letters",
                "attributes": attributes,
            }
        })
    }
}

/// Validated send request; all three print options are mandatory here
#[derive(Debug, Clone, PartialEq)]
pub struct SendLetterPlan {
    pub letter_id: String,
    pub delivery_product: DeliveryProduct,
    pub print_mode: PrintMode,
    pub print_spectrum: PrintSpectrum,
    pub meta_data: Option<Map<String, Value>>,
    pub idempotency_key: Option<String>,
}

impl SendLetterPlan {
    pub fn from_request(request: &SendLetterRequest) -> Result<Self> {
        if request.letter_id.is_empty() {
            return Err(PingenError::validation("letter id required"));
        }

        fn required(value: &Option<String>) -> Option<&str> {
            value.as_deref().filter(|v| !v.is_empty())
        }

        let (Some(delivery_product), Some(print_mode), Some(print_spectrum)) = (
            required(&request.delivery_product),
            required(&request.print_mode),
            required(&request.print_spectrum),
        ) else {
            return Err(PingenError::validation(
                "delivery-product, print-mode, and print-spectrum are required",
            ));
        };

        let delivery_product: DeliveryProduct = delivery_product.parse()?;
        let print_mode: PrintMode = print_mode.parse()?;
        let print_spectrum: PrintSpectrum = print_spectrum.parse()?;
        let meta_data = load_meta_data(request.meta_json.as_deref(), request.meta_file.as_deref())?;

        Ok(Self {
            letter_id: request.letter_id.clone(),
            delivery_product,
            print_mode,
            print_spectrum,
            meta_data,
            idempotency_key: request.idempotency_key.clone().filter(|key| !key.is_empty()),
        })
    }

    pub fn attributes(&self) -> Map<String, Value> {
        let mut attributes = Map::new();
        insert_print_options(
            &mut attributes,
            Some(self.delivery_product),
            Some(self.print_mode),
            Some(self.print_spectrum),
            self.meta_data.as_ref(),
        );
        attributes
    }

    pub fn preview(&self, organisation_id: &str) -> Value {
        json!({
            "action": "letters.send",
            "organisation_id": organisation_id,
            "letter_id": self.letter_id,
            "attributes": self.attributes(),
        })
    }

    /// JSON:API body for `PATCH /organisations/{org}/letters/{id}/send`
    pub fn request_body(&self) -> Value {
        json!({
            "data": {
                "id": self.letter_id,
                "type": "letters",
                "attributes": self.attributes(),
            }
        })
    }
}

fn insert_print_options(
    attributes: &mut Map<String, Value>,
    delivery_product: Option<DeliveryProduct>,
    print_mode: Option<PrintMode>,
    print_spectrum: Option<PrintSpectrum>,
    meta_data: Option<&Map<String, Value>>,
) {
    if let Some(product) = delivery_product {
        attributes.insert("delivery_product".into(), json!(product.as_str()));
    }
    if let Some(mode) = print_mode {
        attributes.insert("print_mode".into(), json!(mode.as_str()));
    }
    if let Some(spectrum) = print_spectrum {
        attributes.insert("print_spectrum".into(), json!(spectrum.as_str()));
    }
    if let Some(meta) = meta_data {
        attributes.insert("meta_data".into(), Value::Object(meta.clone()));
    }
}

fn ensure_readable_file(path: &Path) -> Result<()> {
    let readable = File::open(path)
        .and_then(|file| file.metadata())
        .map(|metadata| metadata.is_file())
        .unwrap_or(false);
    if readable {
        Ok(())
    } else {
        Err(PingenError::validation(format!("file not found: {}", path.display())))
    }
}

/// Display name for an uploaded file: its base name, or `document.pdf`
pub fn default_file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string())
}

/// Resolve letter meta data from `--meta-json` (inline or `@path`) or `--meta-file`
pub fn load_meta_data(
    meta_json: Option<&str>,
    meta_file: Option<&Path>,
) -> Result<Option<Map<String, Value>>> {
    let meta_json = meta_json.filter(|value| !value.is_empty());
    let meta_file = meta_file.filter(|path| !path.as_os_str().is_empty());

    match (meta_json, meta_file) {
        (Some(_), Some(_)) => Err(PingenError::validation(
            "use either --meta-json or --meta-file",
        )),
        (None, Some(path)) => parse_json_object(&std::fs::read(path)?).map(Some),
        (Some(inline), None) => match inline.strip_prefix('@') {
            Some(path) => parse_json_object(&std::fs::read(path)?).map(Some),
            None => parse_json_object(inline.as_bytes()).map(Some),
        },
        (None, None) => Ok(None),
    }
}

/// Parse `content` as a JSON object; arrays, scalars and invalid JSON are rejected
pub fn parse_json_object(content: &[u8]) -> Result<Map<String, Value>> {
    match serde_json::from_slice::<Value>(content) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(PingenError::validation("invalid JSON payload")),
    }
}

/// How a letter workflow ended
#[derive(Debug, Clone)]
pub enum LetterOutcome {
    /// Dry run: the request that would have been made, no network access
    Previewed(Value),
    Completed {
        response: ApiResponse,
        /// Settings after token acquisition, to be threaded forward
        settings: Settings,
        /// What happened to a refreshed token
        persistence: Persistence,
    },
}

impl LetterOutcome {
    /// The JSON to present: the preview, or the response envelope
    pub fn body(&self) -> &Value {
        match self {
            LetterOutcome::Previewed(preview) => preview,
            LetterOutcome::Completed { response, .. } => &response.body,
        }
    }

    pub fn is_preview(&self) -> bool {
        matches!(self, LetterOutcome::Previewed(_))
    }
}

/// Sequences the calls for `letters create` and `letters send`
pub struct LetterWorkflow<'a, A: PingenApi + ?Sized> {
    api: &'a A,
    tokens: &'a TokenManager,
    timeout: Duration,
    dry_run: bool,
}

impl<'a, A: PingenApi + ?Sized> LetterWorkflow<'a, A> {
    pub fn new(api: &'a A, tokens: &'a TokenManager, timeout: Duration) -> Self {
        Self {
            api,
            tokens,
            timeout,
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Validate, then upload the file and create the letter.
    ///
    /// Any failure aborts the sequence; a failed upload never reaches creation.
    pub async fn create(&self, settings: Settings, request: &CreateLetterRequest) -> Result<LetterOutcome> {
        let organisation_id = settings.require_organisation()?.to_string();
        let plan = CreateLetterPlan::from_request(request)?;

        if self.dry_run {
            log::info!("Dry run: not creating letter from {}", plan.file.display());
            return Ok(LetterOutcome::Previewed(plan.preview(&organisation_id)));
        }

        let grant = self.tokens.ensure_access_token(self.api, settings).await?;

        log::info!("Requesting upload slot");
        let slot = self.api.get_file_upload(&grant.token).await?;

        log::info!("Uploading {}", plan.file.display());
        self.api
            .upload_file(&slot.url, &plan.file, upload_timeout(self.timeout))
            .await?;

        log::info!("Creating letter in organisation {}", organisation_id);
        let response = self
            .api
            .create_letter(
                &grant.token,
                &organisation_id,
                &plan.request_body(&slot),
                plan.idempotency_key.as_deref(),
            )
            .await?;

        Ok(LetterOutcome::Completed {
            response,
            settings: grant.settings,
            persistence: grant.persistence,
        })
    }

    /// Validate, then submit the send request for an existing letter
    pub async fn send(&self, settings: Settings, request: &SendLetterRequest) -> Result<LetterOutcome> {
        let organisation_id = settings.require_organisation()?.to_string();
        let plan = SendLetterPlan::from_request(request)?;

        if self.dry_run {
            log::info!("Dry run: not sending letter {}", plan.letter_id);
            return Ok(LetterOutcome::Previewed(plan.preview(&organisation_id)));
        }

        let grant = self.tokens.ensure_access_token(self.api, settings).await?;

        log::info!("Sending letter {}", plan.letter_id);
        let response = self
            .api
            .send_letter(
                &grant.token,
                &organisation_id,
                &plan.letter_id,
                &plan.request_body(),
                plan.idempotency_key.as_deref(),
            )
            .await?;

        Ok(LetterOutcome::Completed {
            response,
            settings: grant.settings,
            persistence: grant.persistence,
        })
    }
}
