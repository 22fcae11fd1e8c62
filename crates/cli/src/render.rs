//! Plain-text output for the commands.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use winkel_core::{CatalogItem, Order, Price, User};
use winkel_storefront::cart::CartManager;
use winkel_storefront::checkout::PriceDrift;
use winkel_storefront::error::AppError;

pub fn message(text: &str) {
    println!("{text}");
}

/// The single user-facing error line.
pub fn error(err: &AppError) {
    eprintln!("error: {}", err.user_message());
}

pub fn user(user: &User) {
    let name = [user.first_name.as_deref(), user.last_name.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
    if name.is_empty() {
        println!("{}", user.email);
    } else {
        println!("{name} <{}>", user.email);
    }
    if user.is_admin {
        println!("role: administrator");
    }
}

pub fn users(users: &[User]) {
    if users.is_empty() {
        println!("No users.");
        return;
    }
    for user in users {
        let active = if user.is_active == Some(false) {
            "inactive"
        } else {
            "active"
        };
        let role = if user.is_admin { "  admin" } else { "" };
        println!("{}  {:<32} {active}{role}", user.id, user.email.as_str());
    }
}

pub fn items(items: &[CatalogItem]) {
    if items.is_empty() {
        println!("No items available.");
        return;
    }
    for item in items {
        let stock = if item.stock > 0 {
            format!("{} in stock", item.stock)
        } else {
            "sold out".to_string()
        };
        println!("{}  {:<32} {:>10}  {stock}", item.id, item.name, item.price.to_string());
    }
}

pub fn item(item: &CatalogItem) {
    println!("{}", item.name);
    println!("  id:       {}", item.id);
    println!("  price:    {}", item.price);
    println!("  stock:    {}", item.stock);
    if let Some(category) = &item.category {
        println!("  category: {category}");
    }
    if !item.is_active {
        println!("  (not listed)");
    }
    if let Some(description) = &item.description {
        println!();
        println!("{description}");
    }
}

pub fn cart(cart: &CartManager) {
    if cart.is_empty() {
        println!("Your cart is empty.");
        return;
    }
    for line in cart.lines() {
        println!(
            "{:>3} x {:<32} {:>10} {:>10}  ({})",
            line.quantity.get(),
            line.name,
            line.price.to_string(),
            Price::format_amount(line.line_total()),
            line.id
        );
    }
    cart_summary(cart);
}

pub fn cart_summary(cart: &CartManager) {
    println!(
        "{} item(s), total {}",
        cart.item_count(),
        Price::format_amount(cart.total())
    );
}

pub fn price_drift(drift: &[PriceDrift]) {
    println!("Note: these prices changed since you added them; you pay the cart price.");
    for d in drift {
        println!("  {}: {} in cart, {} now", d.name, d.in_cart, d.in_catalog);
    }
}

pub fn orders(orders: &[Order]) {
    if orders.is_empty() {
        println!("You have no orders yet.");
        return;
    }
    for order in orders {
        println!(
            "{}  {}  {:<10} {:>10}  {} item(s)",
            order.id,
            order.created_at.format("%Y-%m-%d %H:%M"),
            order.status.as_str(),
            order.total_amount.to_string(),
            order.item_count()
        );
    }
}

pub fn order(order: &Order) {
    println!("Order {}", order.id);
    println!("  placed:  {}", order.created_at.format("%Y-%m-%d %H:%M"));
    println!("  status:  {}", order.status);
    println!("  ship to: {}", order.address());
    for line in &order.items {
        println!(
            "  {:>3} x {:<32} {:>10}",
            line.quantity.get(),
            line.product_name,
            Price::format_amount(line.line_total())
        );
    }
    println!("  total:   {}", order.total_amount);
}
