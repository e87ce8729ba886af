//! 配置校验模块
//!
//! 校验规则：
//! - 0 < capacity <= MAX_CAPACITY，且 children 数量不超过 capacity
//! - supported_types 无重复
//! - child name 非空且唯一
//! - child / event 的 smi_type 必须在 supported_types 内
//! - event count > 0

use std::collections::HashSet;

use contracts::{ContractError, DispatchBlueprint, SmiType, MAX_CAPACITY};

/// 校验 DispatchBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &DispatchBlueprint) -> Result<(), ContractError> {
    validate_capacity(blueprint)?;
    let supported = validate_supported_types(blueprint)?;
    validate_children(blueprint, &supported)?;
    validate_scenario(blueprint, &supported)?;
    Ok(())
}

/// 校验 arena 容量
fn validate_capacity(blueprint: &DispatchBlueprint) -> Result<(), ContractError> {
    let capacity = blueprint.dispatcher.capacity;
    if capacity == 0 {
        return Err(ContractError::config_validation(
            "dispatcher.capacity",
            "capacity must be > 0",
        ));
    }
    if capacity > MAX_CAPACITY {
        return Err(ContractError::config_validation(
            "dispatcher.capacity",
            format!("capacity {capacity} exceeds the maximum of {MAX_CAPACITY}"),
        ));
    }
    if blueprint.children.len() > capacity {
        return Err(ContractError::config_validation(
            "children",
            format!(
                "{} children configured but capacity is {}",
                blueprint.children.len(),
                capacity
            ),
        ));
    }
    Ok(())
}

/// 校验 supported_types 唯一性，返回生效集合
fn validate_supported_types(
    blueprint: &DispatchBlueprint,
) -> Result<HashSet<SmiType>, ContractError> {
    let mut seen = HashSet::new();
    for (idx, ty) in blueprint.dispatcher.supported_types.iter().enumerate() {
        if !seen.insert(*ty) {
            return Err(ContractError::config_validation(
                format!("dispatcher.supported_types[{idx}]"),
                format!("duplicate smi_type '{ty}'"),
            ));
        }
    }
    Ok(blueprint.dispatcher.effective_types().into_iter().collect())
}

/// 校验 children
fn validate_children(
    blueprint: &DispatchBlueprint,
    supported: &HashSet<SmiType>,
) -> Result<(), ContractError> {
    let mut names = HashSet::new();
    for (idx, child) in blueprint.children.iter().enumerate() {
        if child.name.is_empty() {
            return Err(ContractError::config_validation(
                format!("children[{idx}].name"),
                "child name cannot be empty",
            ));
        }
        if !names.insert(child.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("children[name={}]", child.name),
                "duplicate child name",
            ));
        }
        if !supported.contains(&child.smi_type) {
            return Err(ContractError::config_validation(
                format!("children[{}].smi_type", child.name),
                format!("smi_type '{}' is not supported by this dispatcher", child.smi_type),
            ));
        }
    }
    Ok(())
}

/// 校验 scenario
fn validate_scenario(
    blueprint: &DispatchBlueprint,
    supported: &HashSet<SmiType>,
) -> Result<(), ContractError> {
    let Some(scenario) = &blueprint.scenario else {
        return Ok(());
    };

    for (idx, event) in scenario.events.iter().enumerate() {
        if event.count == 0 {
            return Err(ContractError::config_validation(
                format!("scenario.events[{idx}].count"),
                "count must be > 0",
            ));
        }
        if !supported.contains(&event.smi_type) {
            return Err(ContractError::config_validation(
                format!("scenario.events[{idx}].smi_type"),
                format!("smi_type '{}' is not supported by this dispatcher", event.smi_type),
            ));
        }
    }
    Ok(())
}
