use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Hex account or object address, e.g. `0x2`
pub type Address = String;

/// Reference to a slot in a programmable transaction's input or result table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArgumentRef {
    GasCoin,
    Input(u16),
    Result(u16),
    NestedResult(u16, u16),
}

/// A transaction input as reported by the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InputValue {
    #[serde(rename_all = "camelCase")]
    Pure {
        value: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value_type: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Object { object_id: String },
}

impl InputValue {
    pub fn pure_u64(value: u64) -> Self {
        InputValue::Pure {
            // u64 values travel as strings on the wire
            value: Value::String(value.to_string()),
            value_type: Some("u64".to_string()),
        }
    }

    pub fn object(object_id: impl Into<String>) -> Self {
        InputValue::Object {
            object_id: object_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveCall {
    pub package: Address,
    pub module: String,
    pub function: String,
    #[serde(default)]
    pub type_arguments: Vec<String>,
    #[serde(default)]
    pub arguments: Vec<ArgumentRef>,
}

impl MoveCall {
    /// Whether this call targets `package::module::function`
    pub fn targets(&self, package: &str, module: &str, function: &str) -> bool {
        crate::types::addresses_equal(&self.package, package)
            && self.module == module
            && self.function == function
    }
}

/// One command of a programmable transaction.
///
/// Commands other than `MoveCall` and `SplitCoins` are kept opaque.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgrammableCommand {
    MoveCall(MoveCall),
    SplitCoins(ArgumentRef, Vec<ArgumentRef>),
    Other { kind: String, body: Value },
}

impl ProgrammableCommand {
    pub fn as_move_call(&self) -> Option<&MoveCall> {
        match self {
            ProgrammableCommand::MoveCall(call) => Some(call),
            _ => None,
        }
    }
}

impl Serialize for ProgrammableCommand {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = Map::new();
        match self {
            ProgrammableCommand::MoveCall(call) => {
                let body = serde_json::to_value(call).map_err(serde::ser::Error::custom)?;
                map.insert("MoveCall".to_string(), body);
            }
            ProgrammableCommand::SplitCoins(coin, amounts) => {
                let body = serde_json::to_value((coin, amounts)).map_err(serde::ser::Error::custom)?;
                map.insert("SplitCoins".to_string(), body);
            }
            ProgrammableCommand::Other { kind, body } => {
                map.insert(kind.clone(), body.clone());
            }
        }
        Value::Object(map).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ProgrammableCommand {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let (kind, body) = match value {
            Value::Object(map) if map.len() == 1 => match map.into_iter().next() {
                Some(entry) => entry,
                None => return Err(de::Error::custom("empty command")),
            },
            Value::String(kind) => (kind, Value::Null),
            other => {
                return Err(de::Error::custom(format!(
                    "expected a single-key command object, got {}",
                    other
                )))
            }
        };

        match kind.as_str() {
            "MoveCall" => serde_json::from_value(body)
                .map(ProgrammableCommand::MoveCall)
                .map_err(de::Error::custom),
            "SplitCoins" => serde_json::from_value::<(ArgumentRef, Vec<ArgumentRef>)>(body)
                .map(|(coin, amounts)| ProgrammableCommand::SplitCoins(coin, amounts))
                .map_err(de::Error::custom),
            _ => Ok(ProgrammableCommand::Other { kind, body }),
        }
    }
}

/// Object lifecycle event recorded by a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ObjectChange {
    #[serde(rename_all = "camelCase")]
    Created {
        object_id: String,
        object_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sender: Option<Address>,
    },
    #[serde(rename_all = "camelCase")]
    Mutated {
        object_id: String,
        object_type: String,
    },
    #[serde(rename_all = "camelCase")]
    Deleted {
        object_id: String,
        object_type: String,
    },
    #[serde(other)]
    Other,
}

/// An immutable, chronologically ordered ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub digest: String,
    pub sender: Address,
    #[serde(default)]
    pub inputs: Vec<InputValue>,
    #[serde(default)]
    pub commands: Vec<ProgrammableCommand>,
    #[serde(default)]
    pub object_changes: Vec<ObjectChange>,
}

/// One page of account history
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPage {
    pub data: Vec<TransactionRecord>,
    #[serde(default)]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub has_next_page: bool,
}

/// Point-in-time view of an on-chain object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSnapshot {
    pub object_id: String,
    pub exists: bool,
    #[serde(default)]
    pub object_type: Option<String>,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl ObjectSnapshot {
    pub fn live(object_id: impl Into<String>, object_type: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            object_id: object_id.into(),
            exists: true,
            object_type: Some(object_type.into()),
            fields,
        }
    }

    pub fn deleted(object_id: impl Into<String>) -> Self {
        Self {
            object_id: object_id.into(),
            exists: false,
            object_type: None,
            fields: Map::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// An owned coin object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinObject {
    pub coin_object_id: String,
    pub coin_type: String,
    #[serde(with = "u64_string")]
    pub balance: u64,
}

/// Total balance of one coin type held by an owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinBalance {
    pub coin_type: String,
    #[serde(default)]
    pub coin_object_count: u64,
    #[serde(with = "u64_string")]
    pub total_balance: u64,
}

impl CoinBalance {
    /// What the ledger reports for a coin type the owner holds none of
    pub fn zero(coin_type: impl Into<String>) -> Self {
        Self {
            coin_type: coin_type.into(),
            coin_object_count: 0,
            total_balance: 0,
        }
    }
}

mod u64_string {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        crate::units::parse_raw(&value).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_command_wire_format() {
        let raw = json!([
            {"SplitCoins": [{"Input": 0}, [{"Input": 1}]]},
            {"MoveCall": {
                "package": "0xabc",
                "module": "simple_escrow",
                "function": "create_escrow",
                "type_arguments": ["0x2::sui::SUI", "0xabc::mock_coin::MOCK_COIN"],
                "arguments": [{"NestedResult": [0, 0]}, {"Input": 2}]
            }},
            {"TransferObjects": [[{"Result": 0}], "GasCoin"]}
        ]);

        let commands: Vec<ProgrammableCommand> = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(
            commands[0],
            ProgrammableCommand::SplitCoins(ArgumentRef::Input(0), vec![ArgumentRef::Input(1)])
        );
        let call = commands[1].as_move_call().unwrap();
        assert!(call.targets("0x0abc", "simple_escrow", "create_escrow"));
        assert_eq!(call.arguments[0], ArgumentRef::NestedResult(0, 0));
        assert!(matches!(&commands[2], ProgrammableCommand::Other { kind, .. } if kind == "TransferObjects"));

        assert_eq!(serde_json::to_value(&commands).unwrap(), raw);
    }

    #[test]
    fn test_object_changes_and_inputs() {
        let changes: Vec<ObjectChange> = serde_json::from_value(json!([
            {"type": "created", "objectId": "0x1", "objectType": "0xabc::simple_escrow::Escrow<A, B>", "sender": "0x9", "version": "3"},
            {"type": "mutated", "objectId": "0x2", "objectType": "0x2::coin::Coin<0x2::sui::SUI>"},
            {"type": "published", "packageId": "0x5", "modules": ["m"]}
        ]))
        .unwrap();
        assert!(matches!(&changes[0], ObjectChange::Created { object_id, .. } if object_id == "0x1"));
        assert_eq!(changes[2], ObjectChange::Other);

        let inputs: Vec<InputValue> = serde_json::from_value(json!([
            {"type": "object", "objectType": "immOrOwnedObject", "objectId": "0xc01n"},
            {"type": "pure", "valueType": "u64", "value": "1000"}
        ]))
        .unwrap();
        assert_eq!(inputs[0], InputValue::object("0xc01n"));
        assert_eq!(inputs[1], InputValue::pure_u64(1000));
    }

    #[test]
    fn test_coin_balance_as_string() {
        let coin: CoinObject = serde_json::from_value(json!({
            "coinObjectId": "0xc",
            "coinType": "0x2::sui::SUI",
            "balance": "2500000000"
        }))
        .unwrap();
        assert_eq!(coin.balance, 2_500_000_000);

        let balance: CoinBalance = serde_json::from_value(json!({
            "coinType": "0x2::sui::SUI",
            "coinObjectCount": 3,
            "totalBalance": "7000000000",
            "lockedBalance": {}
        }))
        .unwrap();
        assert_eq!(balance.total_balance, 7_000_000_000);
        assert_eq!(balance.coin_object_count, 3);
    }
}
