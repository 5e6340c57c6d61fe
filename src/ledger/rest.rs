use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::trace;
use url::Url;

use super::client::LedgerReader;
use super::error::LedgerError;
use crate::table::phase::GamePhase;
use crate::table::types::{
    ActionOn, Address, CardValue, Chips, SeatCount, SeatIndex, SeatInfo, SeatStatus, TableConfig,
    TableState,
};

const LOG_TARGET: &str = "holdem_client::ledger::rest";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct ViewRequest<'a> {
    function: String,
    type_arguments: [&'a str; 0],
    arguments: Vec<Value>,
}

/// `LedgerReader` over a fullnode's JSON `POST /view` endpoint.
#[derive(Clone, Debug)]
pub struct RestLedgerClient {
    http: reqwest::Client,
    view_url: Url,
    module: String,
}

impl RestLedgerClient {
    /// `node_url` is the REST root (e.g. `https://node.example/v1`); `module`
    /// is `<address>::<module_name>`.
    pub fn new(node_url: &Url, module: impl Into<String>) -> Result<Self, LedgerError> {
        let mut view_url = node_url.clone();
        view_url
            .path_segments_mut()
            .map_err(|_| LedgerError::Transport(format!("{node_url} cannot be a base url")))?
            .pop_if_empty()
            .push("view");
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            view_url,
            module: module.into(),
        })
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    async fn view(
        &self,
        function: &'static str,
        arguments: Vec<Value>,
    ) -> Result<Vec<Value>, LedgerError> {
        let request = ViewRequest {
            function: format!("{}::{function}", self.module),
            type_arguments: [],
            arguments,
        };
        trace!(target = LOG_TARGET, function, "view request");
        let response = self
            .http
            .post(self.view_url.clone())
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LedgerError::Rejected(format!("{function}: {status} {body}")));
        }
        response
            .json::<Vec<Value>>()
            .await
            .map_err(|err| LedgerError::decode(function, err.to_string()))
    }

    async fn view_table(
        &self,
        function: &'static str,
        table: &Address,
    ) -> Result<Vec<Value>, LedgerError> {
        self.view(function, vec![Value::String(table.as_str().to_string())])
            .await
    }
}

/// Positional access into a view's return tuple.
struct Returned<'a> {
    function: &'static str,
    values: &'a [Value],
}

impl<'a> Returned<'a> {
    fn new(function: &'static str, values: &'a [Value]) -> Self {
        Self { function, values }
    }

    fn at(&self, idx: usize) -> Result<&'a Value, LedgerError> {
        self.values
            .get(idx)
            .ok_or_else(|| LedgerError::decode(self.function, format!("missing return value {idx}")))
    }

    fn u64(&self, idx: usize) -> Result<u64, LedgerError> {
        parse_u64(self.function, self.at(idx)?)
    }

    fn u8(&self, idx: usize) -> Result<u8, LedgerError> {
        let raw = self.u64(idx)?;
        u8::try_from(raw).map_err(|_| LedgerError::decode(self.function, format!("{raw} exceeds u8")))
    }

    fn bool(&self, idx: usize) -> Result<bool, LedgerError> {
        parse_bool(self.function, self.at(idx)?)
    }

    fn address(&self, idx: usize) -> Result<Address, LedgerError> {
        match self.at(idx)? {
            Value::String(raw) => Ok(Address::new(raw.clone())),
            other => Err(LedgerError::decode(self.function, format!("expected address, got {other}"))),
        }
    }

    /// Vectors that come back as anything but an array read as empty.
    fn list(&self, idx: usize) -> Result<&'a [Value], LedgerError> {
        Ok(match self.at(idx)? {
            Value::Array(items) => items.as_slice(),
            _ => &[],
        })
    }
}

/// The node encodes `u64` and wider as decimal strings and narrower ints as
/// JSON numbers; accept both.
pub(crate) fn parse_u64(function: &'static str, value: &Value) -> Result<u64, LedgerError> {
    match value {
        Value::String(raw) => raw
            .parse::<u64>()
            .map_err(|err| LedgerError::decode(function, format!("{raw:?}: {err}"))),
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| LedgerError::decode(function, format!("{n} is not a u64"))),
        other => Err(LedgerError::decode(function, format!("expected integer, got {other}"))),
    }
}

pub(crate) fn parse_bool(function: &'static str, value: &Value) -> Result<bool, LedgerError> {
    match value {
        Value::Bool(flag) => Ok(*flag),
        Value::String(raw) if raw == "true" => Ok(true),
        Value::String(raw) if raw == "false" => Ok(false),
        other => Err(LedgerError::decode(function, format!("expected bool, got {other}"))),
    }
}

/// `vector<u8>` arrives either as `0x` hex or as an array of small ints.
pub(crate) fn parse_bytes(function: &'static str, value: &Value) -> Result<Vec<u8>, LedgerError> {
    match value {
        Value::String(raw) => {
            let digits = raw.strip_prefix("0x").unwrap_or(raw);
            hex::decode(digits).map_err(|err| LedgerError::decode(function, err.to_string()))
        }
        Value::Array(items) => items
            .iter()
            .map(|item| {
                let raw = parse_u64(function, item)?;
                u8::try_from(raw)
                    .map_err(|_| LedgerError::decode(function, format!("byte {raw} out of range")))
            })
            .collect(),
        other => Err(LedgerError::decode(function, format!("expected bytes, got {other}"))),
    }
}

fn parse_list<T>(
    function: &'static str,
    items: &[Value],
    parse: impl Fn(&'static str, &Value) -> Result<T, LedgerError>,
) -> Result<Vec<T>, LedgerError> {
    items.iter().map(|item| parse(function, item)).collect()
}

fn narrow_u8(function: &'static str, value: &Value) -> Result<u8, LedgerError> {
    let raw = parse_u64(function, value)?;
    u8::try_from(raw).map_err(|_| LedgerError::decode(function, format!("{raw} exceeds u8")))
}

#[async_trait]
impl LedgerReader for RestLedgerClient {
    async fn table_config(&self, table: &Address) -> Result<TableConfig, LedgerError> {
        const FN: &str = "get_table_config_full";
        let values = self.view_table(FN, table).await?;
        let r = Returned::new(FN, &values);
        Ok(TableConfig {
            small_blind: r.u64(0)?,
            big_blind: r.u64(1)?,
            min_buy_in: r.u64(2)?,
            max_buy_in: r.u64(3)?,
            ante: r.u64(4)?,
            straddle_enabled: r.bool(5)?,
            fee_basis_points: r.u64(6)?,
        })
    }

    async fn table_state(&self, table: &Address) -> Result<TableState, LedgerError> {
        const FN: &str = "get_table_state";
        let values = self.view_table(FN, table).await?;
        let r = Returned::new(FN, &values);
        Ok(TableState {
            hand_number: r.u64(0)?,
            dealer_seat: r.u8(1)?,
            next_big_blind: r.u8(2)?,
            total_fees_collected: r.u64(3)?,
        })
    }

    async fn seat_info(
        &self,
        table: &Address,
        seat: SeatIndex,
    ) -> Result<Option<SeatInfo>, LedgerError> {
        const FN: &str = "get_seat_info_full";
        let values = self
            .view(
                FN,
                vec![
                    Value::String(table.as_str().to_string()),
                    Value::String(seat.to_string()),
                ],
            )
            .await?;
        decode_seat(&values)
    }

    async fn game_phase(&self, table: &Address) -> Result<GamePhase, LedgerError> {
        const FN: &str = "get_game_phase";
        let values = self.view_table(FN, table).await?;
        let code = Returned::new(FN, &values).u8(0)?;
        GamePhase::from_code(code).map_err(|err| LedgerError::decode(FN, err.to_string()))
    }

    async fn pot_size(&self, table: &Address) -> Result<Chips, LedgerError> {
        const FN: &str = "get_pot_size";
        let values = self.view_table(FN, table).await?;
        Returned::new(FN, &values).u64(0)
    }

    async fn community_cards(&self, table: &Address) -> Result<Vec<CardValue>, LedgerError> {
        const FN: &str = "get_community_cards";
        let values = self.view_table(FN, table).await?;
        let r = Returned::new(FN, &values);
        // vector<u8> may also come back hex encoded
        match r.at(0)? {
            Value::String(_) => parse_bytes(FN, r.at(0)?),
            _ => parse_list(FN, r.list(0)?, narrow_u8),
        }
    }

    async fn action_on(&self, table: &Address) -> Result<Option<ActionOn>, LedgerError> {
        const FN: &str = "get_action_on";
        let values = self.view_table(FN, table).await?;
        decode_action_on(&values)
    }

    async fn current_bets(&self, table: &Address) -> Result<Vec<Chips>, LedgerError> {
        const FN: &str = "get_current_bets";
        let values = self.view_table(FN, table).await?;
        parse_list(FN, Returned::new(FN, &values).list(0)?, parse_u64)
    }

    async fn player_statuses(&self, table: &Address) -> Result<Vec<SeatStatus>, LedgerError> {
        const FN: &str = "get_player_statuses";
        let values = self.view_table(FN, table).await?;
        parse_list(FN, Returned::new(FN, &values).list(0)?, |function, value| {
            let code = narrow_u8(function, value)?;
            SeatStatus::from_code(code)
                .ok_or_else(|| LedgerError::decode(function, format!("unknown seat status {code}")))
        })
    }

    async fn min_raise(&self, table: &Address) -> Result<Chips, LedgerError> {
        const FN: &str = "get_min_raise";
        let values = self.view_table(FN, table).await?;
        Returned::new(FN, &values).u64(0)
    }

    async fn call_amount(&self, table: &Address, seat: SeatIndex) -> Result<Chips, LedgerError> {
        const FN: &str = "get_call_amount";
        let values = self
            .view(
                FN,
                vec![
                    Value::String(table.as_str().to_string()),
                    Value::String(seat.to_string()),
                ],
            )
            .await?;
        Returned::new(FN, &values).u64(0)
    }

    async fn is_paused(&self, table: &Address) -> Result<bool, LedgerError> {
        const FN: &str = "is_paused";
        let values = self.view_table(FN, table).await?;
        Returned::new(FN, &values).bool(0)
    }

    async fn is_admin_only_start(&self, table: &Address) -> Result<bool, LedgerError> {
        const FN: &str = "is_admin_only_start";
        let values = self.view_table(FN, table).await?;
        Returned::new(FN, &values).bool(0)
    }

    async fn admin(&self, table: &Address) -> Result<Address, LedgerError> {
        const FN: &str = "get_admin";
        let values = self.view_table(FN, table).await?;
        Returned::new(FN, &values).address(0)
    }

    async fn pending_leaves(&self, table: &Address) -> Result<Vec<bool>, LedgerError> {
        const FN: &str = "get_pending_leaves";
        let values = self.view_table(FN, table).await?;
        parse_list(FN, Returned::new(FN, &values).list(0)?, parse_bool)
    }

    async fn seat_count(&self, table: &Address) -> Result<SeatCount, LedgerError> {
        const FN: &str = "get_seat_count";
        let values = self.view_table(FN, table).await?;
        let r = Returned::new(FN, &values);
        Ok(SeatCount {
            occupied: r.u8(0)?,
            total: r.u8(1)?,
        })
    }

    async fn players_in_hand(&self, table: &Address) -> Result<Vec<SeatIndex>, LedgerError> {
        const FN: &str = "get_players_in_hand";
        let values = self.view_table(FN, table).await?;
        let r = Returned::new(FN, &values);
        match r.at(0)? {
            Value::String(_) => parse_bytes(FN, r.at(0)?),
            _ => parse_list(FN, r.list(0)?, narrow_u8),
        }
    }

    async fn encrypted_hole_cards(&self, table: &Address) -> Result<Vec<[u8; 2]>, LedgerError> {
        const FN: &str = "get_encrypted_hole_cards";
        let values = self.view_table(FN, table).await?;
        decode_hole_pairs(&values)
    }
}

fn decode_seat(values: &[Value]) -> Result<Option<SeatInfo>, LedgerError> {
    const FN: &str = "get_seat_info_full";
    let r = Returned::new(FN, values);
    let player = r.address(0)?;
    if player.is_empty_account() {
        return Ok(None);
    }
    let code = r.u8(4)?;
    Ok(Some(SeatInfo {
        player,
        chips: r.u64(1)?,
        sitting_out: r.bool(2)?,
        current_bet: r.u64(3)?,
        status: SeatStatus::from_code(code)
            .ok_or_else(|| LedgerError::decode(FN, format!("unknown seat status {code}")))?,
    }))
}

fn decode_action_on(values: &[Value]) -> Result<Option<ActionOn>, LedgerError> {
    const FN: &str = "get_action_on";
    let r = Returned::new(FN, values);
    let player_address = r.address(1)?;
    if player_address.is_empty_account() {
        return Ok(None);
    }
    let deadline = r.u64(2)?;
    Ok(Some(ActionOn {
        seat_index: r.u8(0)?,
        player_address,
        deadline: i64::try_from(deadline).unwrap_or(i64::MAX),
    }))
}

fn decode_hole_pairs(values: &[Value]) -> Result<Vec<[u8; 2]>, LedgerError> {
    const FN: &str = "get_encrypted_hole_cards";
    let r = Returned::new(FN, values);
    r.list(0)?
        .iter()
        .map(|entry| {
            let bytes = parse_bytes(FN, entry)?;
            <[u8; 2]>::try_from(bytes.as_slice()).map_err(|_| {
                LedgerError::decode(FN, format!("expected 2 encrypted bytes, got {}", bytes.len()))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integers_accept_strings_and_numbers() {
        assert_eq!(parse_u64("f", &json!("18446744073709551615")).unwrap(), u64::MAX);
        assert_eq!(parse_u64("f", &json!(7)).unwrap(), 7);
        assert!(parse_u64("f", &json!("-1")).is_err());
        assert!(parse_u64("f", &json!(true)).is_err());
    }

    #[test]
    fn bytes_accept_hex_and_arrays() {
        assert_eq!(parse_bytes("f", &json!("0x0aff")).unwrap(), vec![0x0a, 0xff]);
        assert_eq!(parse_bytes("f", &json!([1, "2", 255])).unwrap(), vec![1, 2, 255]);
        assert!(parse_bytes("f", &json!([256])).is_err());
    }

    #[test]
    fn empty_seat_decodes_to_none() {
        let values = vec![json!("0x0"), json!("0"), json!(false), json!("0"), json!(0)];
        assert_eq!(decode_seat(&values).unwrap(), None);
    }

    #[test]
    fn occupied_seat_decodes_every_field() {
        let values = vec![json!("0xAbC"), json!("1500"), json!(true), json!("40"), json!(2)];
        let seat = decode_seat(&values).unwrap().unwrap();
        assert_eq!(seat.player, Address::new("0xabc"));
        assert_eq!(seat.chips, 1500);
        assert!(seat.sitting_out);
        assert_eq!(seat.current_bet, 40);
        assert_eq!(seat.status, SeatStatus::AllIn);
    }

    #[test]
    fn action_on_without_player_is_none() {
        assert_eq!(
            decode_action_on(&[json!("0"), json!("0x0"), json!("0")]).unwrap(),
            None
        );
        let on = decode_action_on(&[json!("3"), json!("0xbeef"), json!("1700000000")])
            .unwrap()
            .unwrap();
        assert_eq!(on.seat_index, 3);
        assert_eq!(on.deadline, 1_700_000_000);
    }

    #[test]
    fn hole_pairs_must_be_two_bytes() {
        let ok = decode_hole_pairs(&[json!(["0x0102", [3, 4]])]).unwrap();
        assert_eq!(ok, vec![[1, 2], [3, 4]]);
        assert!(decode_hole_pairs(&[json!(["0x010203"])]).is_err());
    }

    #[test]
    fn view_url_appends_to_node_root() {
        let node = Url::parse("https://node.example/v1").unwrap();
        let client = RestLedgerClient::new(&node, "0xcafe::texas_holdem").unwrap();
        assert_eq!(client.view_url.as_str(), "https://node.example/v1/view");

        let trailing = Url::parse("https://node.example/v1/").unwrap();
        let client = RestLedgerClient::new(&trailing, "0xcafe::texas_holdem").unwrap();
        assert_eq!(client.view_url.as_str(), "https://node.example/v1/view");
    }
}
