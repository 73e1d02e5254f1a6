// Copyright (c) 2025 Kumbara.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod categories;
pub mod transactions;
pub mod budgets;
pub mod goals;
pub mod subscriptions;
pub mod summary;
pub mod insights;
pub mod doctor;
