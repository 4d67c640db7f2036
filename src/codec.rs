//! Record codec for the flat-text tables
//!
//! Every table is UTF-8 text with tab-separated fields:
//!
//! - `users.txt`: one line per user,
//!   `username\tpassword\temail\tphoneNumber\tfirstName\tlastName[\trole]`
//! - `products.txt`: blocks separated by a blank line; line 1 is
//!   `id\tname\tprice\tquantity`, the remaining lines are the description
//! - `orders.txt`: blocks separated by a blank line; line 1 is
//!   `orderID\tusername\torderDate\ttotalPrice\tstatus\t<address...>`,
//!   line 2 holds `productId(quantity)` tokens separated by tabs
//! - `ratings.txt`: one line per rating, `username\tproductId\tproductName\trating`
//! - cart files: line 1 is the owner, then one `id\ttitle\tprice\tquantity` line per item
//!
//! Decoding tolerates LF and CRLF and any run of blank lines between blocks.
//! Spilled free-text fields (product description, order address) are re-joined
//! with single spaces, so a description written over several lines reads back
//! as one line. That conversion is lossy and intentional: it is how the
//! existing data files have always been read.
//!
//! A line or block with the wrong number of fields, or a field that does not
//! parse, is a [`DecodeError`]; nothing is silently truncated.

use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::error::{DecodeError, StoreError, StoreResult};
use crate::model::{Cart, CartItem, Order, OrderLine, Product, Rating, Role, User};

/// An entity with a textual record form
pub trait Record: Sized {
    /// Table name used in error reports
    const STORE: &'static str;

    fn encode(&self) -> String;

    fn decode(text: &str) -> Result<Self, DecodeError>;
}

/// A record type that owns a whole table file
pub trait TableRecord: Record {
    fn decode_all(text: &str) -> StoreResult<Vec<Self>>;

    fn encode_all(records: &[Self]) -> String;
}

impl TableRecord for User {
    fn decode_all(text: &str) -> StoreResult<Vec<Self>> {
        decode_users(text)
    }

    fn encode_all(records: &[Self]) -> String {
        encode_lines(records)
    }
}

impl TableRecord for Rating {
    fn decode_all(text: &str) -> StoreResult<Vec<Self>> {
        decode_lines(text)
    }

    fn encode_all(records: &[Self]) -> String {
        encode_lines(records)
    }
}

impl TableRecord for Product {
    fn decode_all(text: &str) -> StoreResult<Vec<Self>> {
        decode_blocks(text)
    }

    fn encode_all(records: &[Self]) -> String {
        encode_blocks(records)
    }
}

impl TableRecord for Order {
    fn decode_all(text: &str) -> StoreResult<Vec<Self>> {
        decode_blocks(text)
    }

    fn encode_all(records: &[Self]) -> String {
        encode_blocks(records)
    }
}

/// Non-blank lines of `text` with any trailing `\r` removed
pub fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
}

/// Groups `text` into blocks separated by one or more blank lines
pub fn split_blocks(text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current.join("\n"));
    }

    blocks
}

/// Decodes a one-record-per-line table
pub fn decode_lines<T: Record>(text: &str) -> StoreResult<Vec<T>> {
    split_lines(text)
        .enumerate()
        .map(|(index, line)| T::decode(line).map_err(|reason| malformed::<T>(index, reason)))
        .collect()
}

/// Decodes a blank-line-delimited table
pub fn decode_blocks<T: Record>(text: &str) -> StoreResult<Vec<T>> {
    split_blocks(text)
        .iter()
        .enumerate()
        .map(|(index, block)| T::decode(block).map_err(|reason| malformed::<T>(index, reason)))
        .collect()
}

pub fn encode_lines<T: Record>(records: &[T]) -> String {
    let mut out = String::new();
    for record in records {
        out.push_str(&record.encode());
        out.push('\n');
    }
    out
}

pub fn encode_blocks<T: Record>(records: &[T]) -> String {
    let mut out = records
        .iter()
        .map(Record::encode)
        .collect::<Vec<_>>()
        .join("\n\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

fn malformed<T: Record>(record: usize, reason: DecodeError) -> StoreError {
    StoreError::MalformedRecord {
        store: T::STORE,
        record: record + 1,
        reason,
    }
}

fn expect_fields<'a>(line: &'a str, expected: usize, what: &str) -> Result<Vec<&'a str>, DecodeError> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != expected {
        return Err(DecodeError::new(format!(
            "{what} has {} fields, expected {expected}",
            fields.len()
        )));
    }
    Ok(fields)
}

fn parse_field<F: FromStr>(value: &str, field: &str) -> Result<F, DecodeError> {
    value
        .trim()
        .parse()
        .map_err(|_| DecodeError::new(format!("invalid {field} `{value}`")))
}

fn parse_money(value: &str, field: &str) -> Result<Decimal, DecodeError> {
    Decimal::from_str(value.trim())
        .map_err(|_| DecodeError::new(format!("invalid {field} `{value}`")))
}

/// Writes dates the way the legacy files do: `YYYY-M-D`
pub fn encode_date(date: NaiveDate) -> String {
    format!("{}-{}-{}", date.year(), date.month(), date.day())
}

/// Accepts both padded and unpadded `YYYY-M-D`
pub fn decode_date(value: &str) -> Result<NaiveDate, DecodeError> {
    let invalid = || DecodeError::new(format!("invalid order date `{value}`"));
    let mut parts = value.trim().splitn(3, '-');
    let (Some(year), Some(month), Some(day)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(invalid());
    };
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    let day: u32 = day.parse().map_err(|_| invalid())?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

impl Record for User {
    const STORE: &'static str = "users";

    fn encode(&self) -> String {
        [
            self.username.as_str(),
            &self.password,
            &self.email,
            &self.phone_number,
            &self.first_name,
            &self.last_name,
            self.role.as_str(),
        ]
        .join("\t")
    }

    /// Six-field legacy lines decode as customers; see [`decode_users`]
    fn decode(text: &str) -> Result<Self, DecodeError> {
        let fields: Vec<&str> = text.split('\t').collect();
        let role = match fields.len() {
            6 => Role::Customer,
            7 => fields[6].parse().map_err(DecodeError::new)?,
            n => {
                return Err(DecodeError::new(format!(
                    "user has {n} fields, expected 6 or 7"
                )))
            }
        };
        if fields[0].is_empty() {
            return Err(DecodeError::new("user has an empty username"));
        }
        Ok(Self {
            username: fields[0].to_string(),
            password: fields[1].to_string(),
            email: fields[2].to_string(),
            phone_number: fields[3].to_string(),
            first_name: fields[4].to_string(),
            last_name: fields[5].to_string(),
            role,
        })
    }
}

/// Decodes the users table, applying the legacy admin rule
///
/// Files written before roles existed have no role column at all; in that
/// case the first record is the administrator.
pub fn decode_users(text: &str) -> StoreResult<Vec<User>> {
    let mut users: Vec<User> = decode_lines(text)?;
    let has_roles = split_lines(text).any(|line| line.split('\t').count() == 7);
    if !has_roles {
        if let Some(first) = users.first_mut() {
            first.role = Role::Admin;
        }
    }
    Ok(users)
}

impl Record for Product {
    const STORE: &'static str = "products";

    fn encode(&self) -> String {
        let header = format!(
            "{}\t{}\t{}\t{}",
            self.id, self.name, self.price, self.quantity
        );
        if self.description.is_empty() {
            header
        } else {
            format!("{header}\n{}", self.description)
        }
    }

    fn decode(text: &str) -> Result<Self, DecodeError> {
        let mut lines = text.lines().map(|line| line.strip_suffix('\r').unwrap_or(line));
        let header = lines
            .next()
            .ok_or_else(|| DecodeError::new("empty product block"))?;
        let fields = expect_fields(header, 4, "product header")?;
        Ok(Self {
            id: fields[0].to_string(),
            name: fields[1].to_string(),
            price: parse_money(fields[2], "price")?,
            quantity: parse_field(fields[3], "quantity")?,
            description: lines.collect::<Vec<_>>().join(" "),
        })
    }
}

impl Record for Order {
    const STORE: &'static str = "orders";

    fn encode(&self) -> String {
        let products = self
            .products
            .iter()
            .map(|line| format!("{}({})", line.product_id, line.quantity))
            .collect::<Vec<_>>()
            .join("\t");
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\n{}",
            self.order_id,
            self.username,
            encode_date(self.order_date),
            self.total_price,
            self.status,
            self.address,
            products
        )
    }

    fn decode(text: &str) -> Result<Self, DecodeError> {
        let mut lines = text.lines().map(|line| line.strip_suffix('\r').unwrap_or(line));
        let header = lines
            .next()
            .ok_or_else(|| DecodeError::new("empty order block"))?;
        let fields: Vec<&str> = header.split('\t').collect();
        if fields.len() < 6 {
            return Err(DecodeError::new(format!(
                "order header has {} fields, expected at least 6",
                fields.len()
            )));
        }
        let items = lines
            .next()
            .ok_or_else(|| DecodeError::new(format!("order {} has no product line", fields[0])))?;
        if lines.next().is_some() {
            return Err(DecodeError::new(format!(
                "order {} has trailing lines",
                fields[0]
            )));
        }

        Ok(Self {
            order_id: fields[0].to_string(),
            username: fields[1].to_string(),
            order_date: decode_date(fields[2])?,
            total_price: parse_money(fields[3], "total price")?,
            status: fields[4].parse().map_err(DecodeError::new)?,
            address: fields[5..].join(" "),
            products: items
                .split('\t')
                .filter(|token| !token.trim().is_empty())
                .map(decode_order_line)
                .collect::<Result<_, _>>()?,
        })
    }
}

/// `101-001(2)`; a bare id means a quantity of 1
///
/// Only a trailing `(n)` group is the quantity, so ids written by hand with
/// parentheses still read back.
fn decode_order_line(token: &str) -> Result<OrderLine, DecodeError> {
    let token = token.trim();
    match token.rsplit_once('(') {
        Some((product_id, rest)) => {
            let quantity = rest
                .strip_suffix(')')
                .ok_or_else(|| DecodeError::new(format!("unterminated order item `{token}`")))?;
            Ok(OrderLine {
                product_id: product_id.to_string(),
                quantity: parse_field(quantity, "order item quantity")?,
            })
        }
        None => Ok(OrderLine {
            product_id: token.to_string(),
            quantity: 1,
        }),
    }
}

impl Record for Rating {
    const STORE: &'static str = "ratings";

    fn encode(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}",
            self.username, self.product_id, self.product_name, self.rating
        )
    }

    fn decode(text: &str) -> Result<Self, DecodeError> {
        let fields = expect_fields(text, 4, "rating")?;
        Ok(Self {
            username: fields[0].to_string(),
            product_id: fields[1].to_string(),
            product_name: fields[2].to_string(),
            rating: parse_field(fields[3], "rating")?,
        })
    }
}

impl Record for CartItem {
    const STORE: &'static str = "cart";

    fn encode(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}",
            self.id, self.title, self.price, self.quantity
        )
    }

    fn decode(text: &str) -> Result<Self, DecodeError> {
        let fields = expect_fields(text, 4, "cart item")?;
        Ok(Self {
            id: fields[0].to_string(),
            title: fields[1].to_string(),
            price: parse_money(fields[2], "price")?,
            quantity: parse_field(fields[3], "quantity")?,
        })
    }
}

/// Decodes a cart file; the first line names the owner
pub fn decode_cart(text: &str) -> StoreResult<Cart> {
    let mut lines = split_lines(text);
    let username = lines.next().ok_or_else(|| StoreError::MalformedRecord {
        store: CartItem::STORE,
        record: 0,
        reason: DecodeError::new("cart file has no owner line"),
    })?;
    let items = lines
        .enumerate()
        .map(|(index, line)| {
            CartItem::decode(line).map_err(|reason| malformed::<CartItem>(index, reason))
        })
        .collect::<StoreResult<_>>()?;
    Ok(Cart {
        username: username.trim().to_string(),
        items,
    })
}

/// An emptied cart is just its owner line
pub fn encode_cart(cart: &Cart) -> String {
    let mut out = format!("{}\n", cart.username);
    out.push_str(&encode_lines(&cart.items));
    out
}
