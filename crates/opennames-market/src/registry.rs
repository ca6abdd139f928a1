//! Registry operations: registration, renewal, ownership transfer,
//! controller changes, and resolution-config updates.
//!
//! Every mutation updates its reverse indices (owner→names,
//! address→names) in the same unit as the record write.

use chrono::{DateTime, Duration, Utc};
use opennames_store::{StateStore, names, reverse_lookup};
use opennames_types::{
    Addr, AssetKind, EventKind, NameRecord, NamesError, ResolutionConfig, Result, constants,
    name::is_valid_name_component, pricing,
};

use crate::{MarketKeeper, bank::BankKeeper};

impl<S: StateStore, B: BankKeeper> MarketKeeper<S, B> {
    /// Register `name` to `owner` for `years`, charging the tiered price.
    ///
    /// A name whose previous registration lapsed past its grace period is
    /// free to claim; the stale record and its indices are replaced.
    pub fn register_name(
        &mut self,
        now: DateTime<Utc>,
        name: &str,
        owner: &Addr,
        years: u32,
    ) -> Result<NameRecord> {
        if !is_valid_name_component(name) {
            return Err(NamesError::InvalidName {
                name: name.to_string(),
                reason: "must be 1-20 lowercase alphanumerics with single hyphens".to_string(),
            });
        }
        Addr::parse(owner.as_str())?;
        let params = self.params()?;

        let previous = names::get(&self.store, name)?;
        if let Some(previous) = &previous {
            if !previous.is_expired(now)
                || previous.is_in_grace_period(now, params.misc.grace_period_days)
            {
                return Err(NamesError::NameAlreadyRegistered(name.to_string()));
            }
        }

        let cost = pricing::registration_cost(&params.price, name, years);
        self.bank.charge(owner, &cost)?;

        // Replace any lapsed record: purge its index entries first.
        if let Some(previous) = previous {
            for address in previous.resolved_native_addresses() {
                reverse_lookup::remove_resolved_name(&mut self.store, &address, name)?;
            }
            reverse_lookup::remove_owned_name(&mut self.store, &previous.owner, name)?;
        }

        let record = NameRecord {
            name: name.to_string(),
            owner: owner.clone(),
            controller: owner.clone(),
            expire_at: now + Duration::days(i64::from(years.max(1) * constants::DAYS_PER_YEAR)),
            configs: Vec::new(),
        };
        record.validate()?;
        names::set(&mut self.store, &record)?;
        reverse_lookup::add_owned_name(&mut self.store, owner, name)?;
        reverse_lookup::add_resolved_name(&mut self.store, owner.as_str(), name)?;

        tracing::info!(name, owner = %owner, %cost, "name registered");
        self.emit(EventKind::NameRegistered, name, AssetKind::Name, owner, Some(cost), now);
        Ok(record)
    }

    /// Extend a registration by `years` at the extension price. Allowed
    /// for the owner while the record is live or within its grace period.
    pub fn renew_name(
        &mut self,
        now: DateTime<Utc>,
        name: &str,
        owner: &Addr,
        years: u32,
    ) -> Result<NameRecord> {
        let params = self.params()?;
        let mut record = self.goods_record(name)?;
        Self::require_owner(&record, owner)?;
        if record.is_expired(now) && !record.is_in_grace_period(now, params.misc.grace_period_days)
        {
            return Err(NamesError::NameExpired(name.to_string()));
        }

        let cost = pricing::renewal_cost(&params.price, years);
        self.bank.charge(owner, &cost)?;

        // A lapsed-but-in-grace record extends from now, not from the past.
        let base = record.expire_at.max(now);
        record.expire_at = base + Duration::days(i64::from(years.max(1) * constants::DAYS_PER_YEAR));
        names::set(&mut self.store, &record)?;

        tracing::info!(name, owner = %owner, %cost, "name renewed");
        self.emit(EventKind::NameRenewed, name, AssetKind::Name, owner, Some(cost), now);
        Ok(record)
    }

    /// Transfer ownership to `new_owner`, clearing configs and resetting
    /// the controller.
    pub fn transfer_ownership(
        &mut self,
        now: DateTime<Utc>,
        name: &str,
        owner: &Addr,
        new_owner: &Addr,
    ) -> Result<()> {
        Addr::parse(new_owner.as_str())?;
        let record = self.goods_record(name)?;
        Self::require_owner(&record, owner)?;
        if record.is_expired(now) {
            return Err(NamesError::NameExpired(name.to_string()));
        }

        self.transfer_record(record, new_owner.clone())?;
        tracing::info!(name, from = %owner, to = %new_owner, "ownership transferred");
        self.emit(EventKind::NameTransferred, name, AssetKind::Name, owner, None, now);
        Ok(())
    }

    /// Hand day-to-day config control to another account.
    pub fn set_controller(
        &mut self,
        now: DateTime<Utc>,
        name: &str,
        owner: &Addr,
        controller: &Addr,
    ) -> Result<()> {
        Addr::parse(controller.as_str())?;
        let mut record = self.goods_record(name)?;
        Self::require_owner(&record, owner)?;
        if record.is_expired(now) {
            return Err(NamesError::NameExpired(name.to_string()));
        }

        record.controller = controller.clone();
        names::set(&mut self.store, &record)?;
        self.emit(EventKind::ConfigUpdated, name, AssetKind::Name, owner, None, now);
        Ok(())
    }

    /// Apply one resolution config (upsert, or delete when the value is
    /// empty). Allowed for the controller or the owner. The
    /// address→names index is updated from the record's resolved set in
    /// the same unit.
    pub fn update_resolution_config(
        &mut self,
        now: DateTime<Utc>,
        name: &str,
        actor: &Addr,
        config: ResolutionConfig,
    ) -> Result<()> {
        let mut record = self.goods_record(name)?;
        if &record.controller != actor && &record.owner != actor {
            return Err(NamesError::NotController {
                name: name.to_string(),
                actor: actor.to_string(),
            });
        }
        if record.is_expired(now) {
            return Err(NamesError::NameExpired(name.to_string()));
        }
        config.validate()?;

        // Coin-type-60 chains resolve to 0x hex addresses, not bech32.
        let params = self.params()?;
        if !config.value.is_empty()
            && params.chains.coin_type_60_chain_ids.contains(&config.chain_id)
        {
            let hex_ok = config.value.len() == 42
                && config.value.starts_with("0x")
                && config.value[2..].chars().all(|c| c.is_ascii_hexdigit());
            if !hex_ok {
                return Err(NamesError::InvalidConfig {
                    reason: format!(
                        "value {:?} is not a 0x address for coin-type-60 chain {:?}",
                        config.value, config.chain_id
                    ),
                });
            }
        }

        let before = record.resolved_native_addresses();
        record.apply_config(config);
        record.validate()?;
        let after = record.resolved_native_addresses();

        for address in before.iter().filter(|a| !after.contains(a)) {
            reverse_lookup::remove_resolved_name(&mut self.store, address, name)?;
        }
        for address in after.iter().filter(|a| !before.contains(a)) {
            reverse_lookup::add_resolved_name(&mut self.store, address, name)?;
        }
        names::set(&mut self.store, &record)?;
        self.emit(EventKind::ConfigUpdated, name, AssetKind::Name, actor, None, now);
        Ok(())
    }

    // -----------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------

    /// Fetch a name record.
    pub fn name_record(&self, name: &str) -> Result<Option<NameRecord>> {
        names::get(&self.store, name)
    }

    /// Names owned by an account (reverse lookup).
    pub fn names_owned_by(&self, owner: &Addr) -> Result<Vec<String>> {
        reverse_lookup::names_owned_by(&self.store, owner)
    }

    /// Names resolving to an address (reverse lookup).
    pub fn names_resolving_to(&self, address: &str) -> Result<Vec<String>> {
        reverse_lookup::names_resolving_to(&self.store, address)
    }
}
