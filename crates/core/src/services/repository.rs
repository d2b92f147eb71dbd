use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::holdings::Holdings;
use crate::models::investment::{
    normalize_tag, normalize_tags, Investment, InvestmentPatch, NewInvestment,
};
use crate::storage::store::KeyValueStore;

/// Sole owner of the holdings collection and the tag registry.
///
/// All mutation goes through here. Every method takes `&self`: state lives
/// behind a single mutex, so concurrent callers are serialized and readers
/// always see a whole snapshot. Each successful mutation of the holdings
/// bumps `revision`, and every mutation is written through to the durable
/// store before returning.
///
/// If the write-through fails the in-memory change is kept, the method
/// returns `CoreError::Persistence`, and the repository stays dirty until a
/// later `flush` succeeds.
pub struct InvestmentRepository {
    store: Arc<dyn KeyValueStore>,
    key: String,
    state: Mutex<RepoState>,
}

struct RepoState {
    holdings: Holdings,
    revision: u64,
    /// Tracks whether the in-memory state differs from the durable store.
    dirty: bool,
}

/// What a mutation closure did. `Unchanged` skips the revision bump and the
/// write. `RegistryOnly` writes through but leaves `revision` alone, since no
/// holding changed.
enum Mutation<T> {
    Applied(T),
    RegistryOnly(T),
    Unchanged(T),
}

/// Result of `InvestmentRepository::apply_prices`.
#[derive(Debug)]
pub struct AppliedPrices {
    /// `false` when the repository had moved past the expected revision and
    /// nothing was changed.
    pub applied: bool,
    /// Set when the prices were applied in memory but the write-through failed.
    pub persistence_error: Option<CoreError>,
}

impl std::fmt::Debug for InvestmentRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("InvestmentRepository")
            .field("store", &self.store.name())
            .field("key", &self.key)
            .field("investments", &state.holdings.investments.len())
            .field("tags", &state.holdings.tags.len())
            .field("revision", &state.revision)
            .field("dirty", &state.dirty)
            .finish()
    }
}

impl InvestmentRepository {
    /// An empty repository bound to `key` in `store`. Nothing is read or written yet.
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            state: Mutex::new(RepoState {
                holdings: Holdings::default(),
                revision: 0,
                dirty: false,
            }),
        }
    }

    /// Load the repository from `key` in `store`.
    ///
    /// A missing key yields an empty repository. A stored payload that does
    /// not pass import validation is rejected and the store is left as is.
    pub fn init(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Result<Self, CoreError> {
        let repo = Self::new(store, key);
        if let Some(raw) = repo.store.get(&repo.key)? {
            let value: Value = serde_json::from_str(&raw).map_err(|e| {
                CoreError::Validation(format!("Stored holdings are not valid JSON: {e}"))
            })?;
            let holdings = parse_snapshot(value)?;
            info!(
                "Loaded {} investments and {} tags from {} store",
                holdings.investments.len(),
                holdings.tags.len(),
                repo.store.name()
            );
            repo.lock().holdings = holdings;
        } else {
            debug!("No holdings under '{}', starting empty", repo.key);
        }
        Ok(repo)
    }

    /// Write the current state to the durable store, clearing the dirty flag.
    pub fn flush(&self) -> Result<(), CoreError> {
        let mut state = self.lock();
        self.write_through(&mut state)
    }

    // ── Investments ─────────────────────────────────────────────────

    /// Validate and store a new investment. Assigns `id`, `created_at` and
    /// `updated_at`; a missing expected return takes the type's default.
    pub fn add(&self, input: NewInvestment) -> Result<Investment, CoreError> {
        let now = Utc::now();
        let expected_annual_return = input
            .expected_annual_return
            .unwrap_or_else(|| input.investment_type.default_annual_return());

        let mut investment = Investment {
            id: String::new(),
            ticker: input.ticker.trim().to_uppercase(),
            name: input.name.trim().to_string(),
            investment_type: input.investment_type,
            current_shares: input.current_shares,
            cost_basis_per_share: input.cost_basis_per_share,
            current_price_per_share: input.current_price_per_share,
            monthly_contribution: input.monthly_contribution,
            expected_annual_return,
            tags: normalize_tags(&input.tags),
            notes: input.notes,
            last_price_update: None,
            created_at: now,
            updated_at: now,
        };
        validate_investment(&investment)?;

        self.commit(move |holdings| {
            investment.id = Uuid::new_v4().to_string();
            while holdings.position(&investment.id).is_some() {
                investment.id = Uuid::new_v4().to_string();
            }
            for tag in &investment.tags {
                holdings.register_tag(tag);
            }
            holdings.investments.push(investment.clone());
            Ok(Mutation::Applied(investment))
        })
    }

    /// Merge `patch` into the investment `id`, keeping `id` and `created_at`
    /// and refreshing `updated_at`. The merged record is validated as a whole;
    /// if it fails, nothing changes.
    pub fn update(&self, id: &str, patch: InvestmentPatch) -> Result<Investment, CoreError> {
        self.commit(|holdings| {
            let idx = holdings
                .position(id)
                .ok_or_else(|| CoreError::InvestmentNotFound(id.to_string()))?;

            let mut updated = holdings.investments[idx].clone();
            apply_patch(&mut updated, patch);
            updated.updated_at = Utc::now().max(updated.created_at);
            validate_investment(&updated)?;

            for tag in &updated.tags {
                holdings.register_tag(tag);
            }
            holdings.investments[idx] = updated.clone();
            Ok(Mutation::Applied(updated))
        })
    }

    /// Remove the investment `id`. Returns `false` (and changes nothing) if it
    /// does not exist.
    pub fn delete(&self, id: &str) -> Result<bool, CoreError> {
        self.commit(|holdings| match holdings.position(id) {
            Some(idx) => {
                holdings.investments.remove(idx);
                Ok(Mutation::Applied(true))
            }
            None => {
                debug!("Delete of unknown investment {id} ignored");
                Ok(Mutation::Unchanged(false))
            }
        })
    }

    /// Set `current_price_per_share` and `last_price_update` for each
    /// `(id, price)` pair, but only if the repository is still at
    /// `expected_revision`. Reports `applied: false` without touching anything
    /// when it has moved on. Unknown ids are skipped.
    ///
    /// Only invalid prices are returned as `Err`. A failed write-through keeps
    /// the new prices in memory and comes back in `persistence_error`.
    pub fn apply_prices(
        &self,
        expected_revision: u64,
        prices: &[(String, f64)],
        at: DateTime<Utc>,
    ) -> Result<AppliedPrices, CoreError> {
        if let Some((id, price)) = prices.iter().find(|(_, p)| !p.is_finite() || *p < 0.0) {
            return Err(CoreError::Validation(format!(
                "Invalid price {price} for investment {id}: must be finite and non-negative"
            )));
        }

        let mut state = self.lock();
        if state.revision != expected_revision {
            debug!(
                "Discarding {} price updates: revision {} != expected {}",
                prices.len(),
                state.revision,
                expected_revision
            );
            return Ok(AppliedPrices {
                applied: false,
                persistence_error: None,
            });
        }

        let mut touched = 0;
        for (id, price) in prices {
            if let Some(inv) = state.holdings.investments.iter_mut().find(|i| &i.id == id) {
                inv.current_price_per_share = *price;
                inv.last_price_update = Some(at);
                inv.updated_at = at.max(inv.created_at);
                touched += 1;
            }
        }
        let mut persistence_error = None;
        if touched > 0 {
            state.revision += 1;
            state.dirty = true;
            persistence_error = self.write_through(&mut state).err();
        }
        Ok(AppliedPrices {
            applied: true,
            persistence_error,
        })
    }

    // ── Tags ────────────────────────────────────────────────────────

    /// Register a tag. Returns `false` if it normalizes to nothing or already exists.
    /// Holdings are untouched, so `revision` does not move.
    pub fn add_tag(&self, raw: &str) -> Result<bool, CoreError> {
        let Some(tag) = normalize_tag(raw) else {
            return Ok(false);
        };
        self.commit(move |holdings| {
            if holdings.register_tag(&tag) {
                Ok(Mutation::RegistryOnly(true))
            } else {
                Ok(Mutation::Unchanged(false))
            }
        })
    }

    /// Remove a tag from the registry and from every investment carrying it,
    /// in one step. Returns `false` if the tag was not registered.
    pub fn remove_tag(&self, tag: &str) -> Result<bool, CoreError> {
        let Some(tag) = normalize_tag(tag) else {
            return Ok(false);
        };
        self.commit(move |holdings| {
            if !holdings.has_tag(&tag) {
                return Ok(Mutation::Unchanged(false));
            }
            holdings.tags.retain(|t| *t != tag);
            let now = Utc::now();
            let mut carried = false;
            for inv in holdings.investments.iter_mut().filter(|i| i.has_tag(&tag)) {
                inv.tags.retain(|t| *t != tag);
                inv.updated_at = now.max(inv.created_at);
                carried = true;
            }
            if carried {
                Ok(Mutation::Applied(true))
            } else {
                Ok(Mutation::RegistryOnly(true))
            }
        })
    }

    // ── Import / Export ─────────────────────────────────────────────

    /// Replace all holdings and tags with the JSON snapshot in `json`.
    /// All-or-nothing: on any validation failure the current state is untouched.
    /// Returns the number of investments imported.
    pub fn import_snapshot(&self, json: &str) -> Result<usize, CoreError> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| CoreError::Validation(format!("Snapshot is not valid JSON: {e}")))?;
        self.import_value(value)
    }

    /// Same as `import_snapshot`, for an already-parsed payload.
    pub fn import_value(&self, value: Value) -> Result<usize, CoreError> {
        let holdings = parse_snapshot(value)?;
        let count = holdings.investments.len();
        self.commit(move |current| {
            info!(
                "Importing snapshot: {} investments replace {}",
                holdings.investments.len(),
                current.investments.len()
            );
            *current = holdings;
            Ok(Mutation::Applied(count))
        })
    }

    /// Pretty-printed JSON of `{investments, tags}`, stable for a given state.
    pub fn export_snapshot(&self) -> Result<String, CoreError> {
        let state = self.lock();
        serde_json::to_string_pretty(&state.holdings)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize holdings: {e}")))
    }

    // ── Reads ───────────────────────────────────────────────────────

    /// A consistent copy of the whole state.
    #[must_use]
    pub fn snapshot(&self) -> Holdings {
        self.lock().holdings.clone()
    }

    /// A consistent copy of the state together with the revision it was taken at.
    #[must_use]
    pub fn snapshot_with_revision(&self) -> (Holdings, u64) {
        let state = self.lock();
        (state.holdings.clone(), state.revision)
    }

    /// All investments, in insertion order.
    #[must_use]
    pub fn list(&self) -> Vec<Investment> {
        self.lock().holdings.investments.clone()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<Investment> {
        let state = self.lock();
        state.holdings.investments.iter().find(|i| i.id == id).cloned()
    }

    /// The tag registry, in creation order.
    #[must_use]
    pub fn tags(&self) -> Vec<String> {
        self.lock().holdings.tags.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().holdings.investments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Monotonic counter, bumped on every mutation that changes a holding.
    /// Tag registry changes that touch no holding leave it as is.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.lock().revision
    }

    /// `true` if some mutation has not reached the durable store yet.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.lock().dirty
    }

    // ── Internal ────────────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, RepoState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run `f` under the lock. `f` must validate before it mutates: an `Err`
    /// from it must leave `holdings` unchanged.
    fn commit<T>(
        &self,
        f: impl FnOnce(&mut Holdings) -> Result<Mutation<T>, CoreError>,
    ) -> Result<T, CoreError> {
        let mut state = self.lock();
        match f(&mut state.holdings)? {
            Mutation::Unchanged(value) => Ok(value),
            Mutation::Applied(value) => {
                state.revision += 1;
                state.dirty = true;
                self.write_through(&mut state)?;
                Ok(value)
            }
            Mutation::RegistryOnly(value) => {
                state.dirty = true;
                self.write_through(&mut state)?;
                Ok(value)
            }
        }
    }

    fn write_through(&self, state: &mut RepoState) -> Result<(), CoreError> {
        let payload = serde_json::to_string(&state.holdings)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize holdings: {e}")))?;
        match self.store.put(&self.key, &payload) {
            Ok(()) => {
                state.dirty = false;
                Ok(())
            }
            Err(e) => {
                warn!(
                    "Holdings revision {} not persisted to {} store: {e}",
                    state.revision,
                    self.store.name()
                );
                Err(match e {
                    CoreError::Persistence(msg) => CoreError::Persistence(msg),
                    other => CoreError::Persistence(other.to_string()),
                })
            }
        }
    }
}

fn apply_patch(inv: &mut Investment, patch: InvestmentPatch) {
    if let Some(ticker) = patch.ticker {
        inv.ticker = ticker.trim().to_uppercase();
    }
    if let Some(name) = patch.name {
        inv.name = name.trim().to_string();
    }
    if let Some(investment_type) = patch.investment_type {
        inv.investment_type = investment_type;
    }
    if let Some(v) = patch.current_shares {
        inv.current_shares = v;
    }
    if let Some(v) = patch.cost_basis_per_share {
        inv.cost_basis_per_share = v;
    }
    if let Some(v) = patch.current_price_per_share {
        inv.current_price_per_share = v;
    }
    if let Some(v) = patch.monthly_contribution {
        inv.monthly_contribution = v;
    }
    if let Some(v) = patch.expected_annual_return {
        inv.expected_annual_return = v;
    }
    if let Some(tags) = patch.tags {
        inv.tags = normalize_tags(&tags);
    }
    if let Some(notes) = patch.notes {
        inv.notes = notes;
    }
    if let Some(at) = patch.last_price_update {
        inv.last_price_update = at;
    }
}

/// Structural checks every stored investment must pass.
fn validate_investment(inv: &Investment) -> Result<(), CoreError> {
    if inv.ticker.trim().is_empty() && inv.name.trim().is_empty() {
        return Err(CoreError::Validation(
            "Investment needs a ticker or a name".into(),
        ));
    }
    for (field, value) in [
        ("currentShares", inv.current_shares),
        ("costBasisPerShare", inv.cost_basis_per_share),
        ("currentPricePerShare", inv.current_price_per_share),
        ("monthlyContribution", inv.monthly_contribution),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(CoreError::Validation(format!(
                "{field} must be a finite, non-negative number (got {value})"
            )));
        }
    }
    if !inv.expected_annual_return.is_finite() {
        return Err(CoreError::Validation(format!(
            "expectedAnnualReturn must be finite (got {})",
            inv.expected_annual_return
        )));
    }
    Ok(())
}

/// Validate an import payload into `Holdings` without touching any live state.
fn parse_snapshot(value: Value) -> Result<Holdings, CoreError> {
    let Value::Object(mut obj) = value else {
        return Err(CoreError::Validation("Snapshot must be a JSON object".into()));
    };

    let raw_investments = match obj.remove("investments") {
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(CoreError::Validation(
                "Snapshot field `investments` must be an array".into(),
            ))
        }
        None => {
            return Err(CoreError::Validation(
                "Snapshot is missing the `investments` array".into(),
            ))
        }
    };

    let mut investments: Vec<Investment> = Vec::with_capacity(raw_investments.len());
    for (i, raw) in raw_investments.into_iter().enumerate() {
        let mut inv: Investment = serde_json::from_value(raw)
            .map_err(|e| CoreError::Validation(format!("Investment #{i}: {e}")))?;
        if inv.id.trim().is_empty() {
            return Err(CoreError::Validation(format!("Investment #{i}: empty id")));
        }
        if investments.iter().any(|existing| existing.id == inv.id) {
            return Err(CoreError::Validation(format!(
                "Investment #{i}: duplicate id '{}'",
                inv.id
            )));
        }
        inv.ticker = inv.ticker.trim().to_uppercase();
        inv.name = inv.name.trim().to_string();
        inv.tags = normalize_tags(&inv.tags);
        validate_investment(&inv).map_err(|e| match e {
            CoreError::Validation(msg) => CoreError::Validation(format!("Investment #{i}: {msg}")),
            other => other,
        })?;
        investments.push(inv);
    }

    let raw_tags: Vec<String> = match obj.remove("tags") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|t| match t {
                Value::String(s) => Ok(s),
                other => Err(CoreError::Validation(format!(
                    "Snapshot tags must be strings (got {other})"
                ))),
            })
            .collect::<Result<_, _>>()?,
        Some(_) => {
            return Err(CoreError::Validation(
                "Snapshot field `tags` must be an array".into(),
            ))
        }
    };

    let mut holdings = Holdings {
        investments,
        tags: normalize_tags(&raw_tags),
    };
    let used: Vec<String> = holdings
        .investments
        .iter()
        .flat_map(|inv| inv.tags.iter().cloned())
        .collect();
    for tag in &used {
        holdings.register_tag(tag);
    }
    Ok(holdings)
}
