use crate::error::RuntimeError;
use crate::object::{Key, Value};

type CollectionResult<T> = Result<T, RuntimeError>;

pub fn length(value: &Value) -> CollectionResult<Value> {
    let len = match value {
        Value::String(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        Value::Map(entries) => entries.len(),
        other => {
            return Err(RuntimeError::type_error(format!(
                "len is not defined for {}",
                other.type_name()
            )))
        }
    };
    Ok(Value::Integer(len as i64))
}

/// Materializes `from..to:step`. Both ends are inclusive and the sign of
/// `step` follows the direction of the range.
pub fn range(from: &Value, to: &Value, step: Option<&Value>) -> CollectionResult<Value> {
    let (from, to) = match (from, to) {
        (Value::Integer(from), Value::Integer(to)) => (*from, *to),
        (from, to) => {
            return Err(RuntimeError::type_error(format!(
                "Range bounds must be int, got {} and {}",
                from.type_name(),
                to.type_name()
            )))
        }
    };
    let step = match step {
        None => 1,
        Some(Value::Integer(0)) => return Err(RuntimeError::type_error("Range step cannot be 0")),
        Some(Value::Integer(step)) => step.unsigned_abs(),
        Some(other) => {
            return Err(RuntimeError::type_error(format!(
                "Range step must be int, got {}",
                other.type_name()
            )))
        }
    };
    let step = usize::try_from(step).unwrap_or(usize::MAX);

    let items = if from <= to {
        (from..=to).step_by(step).map(Value::Integer).collect()
    } else {
        (to..=from).rev().step_by(step).map(Value::Integer).collect()
    };
    Ok(Value::Array(items))
}

fn array_position(items_len: usize, index: &Value) -> CollectionResult<usize> {
    match index {
        Value::Integer(i) => match usize::try_from(*i) {
            Ok(position) if position < items_len => Ok(position),
            _ => Err(RuntimeError::type_error(format!(
                "Index {} out of range for length {}",
                i, items_len
            ))),
        },
        other => Err(RuntimeError::type_error(format!(
            "Index must be int, got {}",
            other.type_name()
        ))),
    }
}

/// `subject[index]`. A missing map key reads as nil.
pub fn index(subject: &Value, index: &Value) -> CollectionResult<Value> {
    match subject {
        Value::Array(items) => Ok(items[array_position(items.len(), index)?].clone()),
        Value::Map(entries) => Ok(entries
            .get(&Key::try_from(index)?)
            .cloned()
            .unwrap_or_default()),
        Value::String(s) => {
            let chars: Vec<char> = s.chars().collect();
            let position = array_position(chars.len(), index)?;
            Ok(Value::String(chars[position].to_string()))
        }
        other => Err(RuntimeError::type_error(format!(
            "A value of type {} cannot be indexed",
            other.type_name()
        ))),
    }
}

fn element_mut<'a>(subject: &'a mut Value, index: &Value) -> CollectionResult<&'a mut Value> {
    match subject {
        Value::Array(items) => {
            let position = array_position(items.len(), index)?;
            Ok(&mut items[position])
        }
        Value::Map(entries) => {
            let key = Key::try_from(index)?;
            entries
                .get_mut(&key)
                .ok_or_else(|| RuntimeError::type_error(format!("Key {} not found", key)))
        }
        other => Err(RuntimeError::type_error(format!(
            "A value of type {} cannot be assigned into",
            other.type_name()
        ))),
    }
}

/// Stores `value` at `root[path[0]][path[1]]...`. Every step but the last
/// must already exist; the last inserts into maps and overwrites in arrays.
pub fn assign_path(root: &mut Value, path: &[Value], value: Value) -> CollectionResult<()> {
    let Some((last, init)) = path.split_last() else {
        *root = value;
        return Ok(());
    };
    let mut target = root;
    for step in init {
        target = element_mut(target, step)?;
    }
    match target {
        Value::Map(entries) => {
            entries.insert(Key::try_from(last)?, value);
        }
        other => *element_mut(other, last)? = value,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn ints(values: &[i64]) -> Value {
        Value::Array(values.iter().copied().map(Value::Integer).collect())
    }

    #[test]
    fn length_of_collections() {
        assert_eq!(length(&Value::String("héllo".to_string())).unwrap(), Value::Integer(5));
        assert_eq!(length(&ints(&[1, 2, 3])).unwrap(), Value::Integer(3));
        assert_eq!(length(&Value::Map(BTreeMap::new())).unwrap(), Value::Integer(0));
        assert!(matches!(length(&Value::Integer(3)), Err(RuntimeError::Type(_))));
    }

    #[test]
    fn ranges_are_inclusive_both_ways() {
        let (one, five) = (Value::Integer(1), Value::Integer(5));
        assert_eq!(range(&one, &five, None).unwrap(), ints(&[1, 2, 3, 4, 5]));
        assert_eq!(range(&five, &one, None).unwrap(), ints(&[5, 4, 3, 2, 1]));
        assert_eq!(range(&one, &one, None).unwrap(), ints(&[1]));
    }

    #[test]
    fn range_step_follows_direction() {
        let (one, ten) = (Value::Integer(1), Value::Integer(10));
        let two = Value::Integer(2);
        let minus_two = Value::Integer(-2);
        assert_eq!(range(&one, &ten, Some(&two)).unwrap(), ints(&[1, 3, 5, 7, 9]));
        assert_eq!(range(&one, &ten, Some(&minus_two)).unwrap(), ints(&[1, 3, 5, 7, 9]));
        assert_eq!(range(&ten, &one, Some(&two)).unwrap(), ints(&[10, 8, 6, 4, 2]));
        assert!(range(&one, &ten, Some(&Value::Integer(0))).is_err());
        assert!(range(&one, &Value::Float(2.0), None).is_err());
    }

    #[test]
    fn index_reads() {
        assert_eq!(index(&ints(&[4, 5]), &Value::Integer(1)).unwrap(), Value::Integer(5));
        assert!(index(&ints(&[4, 5]), &Value::Integer(2)).is_err());
        assert!(index(&ints(&[4, 5]), &Value::Integer(-1)).is_err());
        assert_eq!(
            index(&Value::String("abc".to_string()), &Value::Integer(2)).unwrap(),
            Value::String("c".to_string())
        );
        let map = Value::Map(BTreeMap::from([(Key::Integer(1), Value::Boolean(true))]));
        assert_eq!(index(&map, &Value::Integer(1)).unwrap(), Value::Boolean(true));
        assert_eq!(index(&map, &Value::Integer(2)).unwrap(), Value::Nil);
    }

    #[test]
    fn nested_assignment() {
        let mut grid = Value::Array(vec![ints(&[1, 2]), ints(&[3, 4])]);
        assign_path(&mut grid, &[Value::Integer(1), Value::Integer(0)], Value::Integer(9)).unwrap();
        assert_eq!(grid, Value::Array(vec![ints(&[1, 2]), ints(&[9, 4])]));

        let mut map = Value::Map(BTreeMap::new());
        let key = Value::String("k".to_string());
        assign_path(&mut map, &[key.clone()], Value::Integer(1)).unwrap();
        assert_eq!(index(&map, &key).unwrap(), Value::Integer(1));

        assert!(assign_path(&mut grid, &[Value::Integer(5)], Value::Nil).is_err());
        let missing = [Value::String("x".to_string()), Value::Integer(0)];
        assert!(assign_path(&mut map, &missing, Value::Nil).is_err());
    }
}
